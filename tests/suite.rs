// Integration suite: converts the v2 mocks, checks the published fixtures,
// replays the edit convention on a revision pair and drives the CLI end to end.
mod support;

use affiliate_links::{
    CatalogRepository, CategoryId, CategoryIndex, ItemId, check_dir, check_file,
    config::ConvertConfig,
    convert::{ConvertOptions, convert_dir},
    default_category_schema, diff_documents, load_document_from_path, record_edit, stale_items,
};
use anyhow::Result;
use chrono::NaiveDate;
use serde_json::Value;
use std::fs;
use support::{cli, mock, mocks_dir, run, stage};
use tempfile::TempDir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn read_json(path: &std::path::Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn conversion_reproduces_published_fixture() -> Result<()> {
    let dir = TempDir::new()?;
    let out = dir.path().join("v1");
    let options = ConvertOptions::from_config(&ConvertConfig::default(), date(2025, 12, 1));

    let summary = convert_dir(&mocks_dir().join("v2"), &out, &options)?;
    assert!(summary.is_success(), "{:?}", summary.failed);
    let files: Vec<_> = summary.converted.iter().map(|c| c.file.as_str()).collect();
    assert_eq!(files, vec!["bedding_sleep.json", "storage.json"]);

    assert_eq!(
        read_json(&out.join("bedding_sleep.json")),
        read_json(&mock("v1/bedding_sleep.json"))
    );

    let storage = load_document_from_path(&out.join("storage.json"))?;
    assert_eq!(storage.category_id, CategoryId::from("storage"));
    let bins = storage.item(&ItemId::from("underbed-bins")).unwrap();
    assert_eq!(bins.links[0].badge.as_ref().map(|b| b.as_str()), Some("large_capacity"));
    assert_eq!(bins.links[0].affiliate_tag, "dormready");

    let schema = default_category_schema()?;
    let violations = check_dir(&out, &schema)?;
    assert!(violations.is_empty(), "{violations:?}");
    Ok(())
}

#[test]
fn published_fixture_loads_into_repository() -> Result<()> {
    let schema = default_category_schema()?;
    let index = CategoryIndex::load(&mock("v1/bedding_sleep.json"), &schema)?;
    let ranked = index
        .ranked_links(&ItemId::from("twin-xl-sheets"))
        .unwrap();
    assert_eq!(ranked[0].display_name.as_deref(), Some("Mellanni Twin XL Sheet Set"));

    let repo = CatalogRepository::load_dir(&mocks_dir().join("v1"), &schema)?;
    assert_eq!(repo.len(), 1);
    assert!(
        repo.find_item(&CategoryId::from("bedding_sleep"), &ItemId::from("pillow-001"))
            .is_some()
    );
    assert!(check_file(&mock("v1/bedding_sleep.json"), &schema).is_empty());
    Ok(())
}

// Changing pillow-001's URL must bump its itemVersion (1 -> 2), the document
// version and lastUpdated, and leave every other item alone.
#[test]
fn pillow_url_edit_follows_the_update_procedure() -> Result<()> {
    let previous = load_document_from_path(&mock("revisions/bedding_sleep.r1.json"))?;
    let expected = load_document_from_path(&mock("revisions/bedding_sleep.r2.json"))?;

    let pillow = ItemId::from("pillow-001");
    let mut edited = previous.clone();
    edited.item_mut(&pillow).unwrap().links[0].url =
        "https://www.amazon.com/dp/B0CHX1QZ7N?tag=dormready-20".to_string();
    record_edit(&mut edited, &pillow, date(2025, 12, 9))?;
    assert_eq!(edited, expected);

    let report = diff_documents(&previous, &edited);
    assert!(report.is_clean(), "{:?}", report.violations);
    assert_eq!(report.changed, vec![pillow.clone()]);
    assert_eq!(report.unchanged, vec![ItemId::from("twin-xl-sheets")]);
    assert_eq!(
        edited.item(&ItemId::from("twin-xl-sheets")).unwrap().item_version,
        previous.item(&ItemId::from("twin-xl-sheets")).unwrap().item_version
    );

    assert_eq!(stale_items(&previous, &edited), vec![pillow]);
    Ok(())
}

#[test]
fn cli_check_reports_violations_and_exit_status() -> Result<()> {
    let dir = TempDir::new()?;
    let v1 = dir.path().join("v1");
    stage(&v1, "v1/bedding_sleep.json", "bedding_sleep.json")?;

    let mut clean = cli();
    clean.arg("--root").arg(dir.path()).arg("check");
    let output = run(clean)?;
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(output.stdout.is_empty());

    let mut broken = read_json(&mock("v1/bedding_sleep.json"));
    broken["items"]["pillow-001"]["links"][1]["priority"] = Value::from(0);
    broken["items"]["pillow-001"]["links"][1]["averageRating"] = Value::from(7.5);
    fs::write(v1.join("bedding_sleep.json"), broken.to_string())?;

    let mut failing = cli();
    failing
        .arg("check")
        .arg(&v1)
        .arg("--format")
        .arg("json");
    let output = run(failing)?;
    assert_eq!(output.status.code(), Some(1));
    let report: Value = serde_json::from_slice(&output.stdout)?;
    let locations: Vec<&str> = report
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v.get("location").and_then(Value::as_str))
        .collect();
    assert_eq!(
        locations,
        vec![
            "items/pillow-001/links/1/priority",
            "items/pillow-001/links/1/averageRating"
        ]
    );
    Ok(())
}

#[test]
fn cli_convert_writes_generation_dir() -> Result<()> {
    let dir = TempDir::new()?;
    stage(dir.path(), "v2/bedding_sleep.json", "v2/bedding_sleep.json")?;
    stage(dir.path(), "v2/storage.json", "v2/storage.json")?;
    fs::create_dir_all(dir.path().join("v1"))?;

    let mut cmd = cli();
    cmd.arg("--root")
        .arg(dir.path())
        .arg("convert")
        .arg("--date")
        .arg("2025-12-01");
    let output = run(cmd)?;
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("converted 2 file(s), failed 0"));
    assert_eq!(
        read_json(&dir.path().join("v1/bedding_sleep.json")),
        read_json(&mock("v1/bedding_sleep.json"))
    );
    Ok(())
}

#[test]
fn cli_diff_flags_reverted_revision() -> Result<()> {
    let mut forward = cli();
    forward
        .arg("diff")
        .arg(mock("revisions/bedding_sleep.r1.json"))
        .arg(mock("revisions/bedding_sleep.r2.json"));
    let output = run(forward)?;
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("changed pillow-001"), "{text}");

    let mut backward = cli();
    backward
        .arg("diff")
        .arg(mock("revisions/bedding_sleep.r2.json"))
        .arg(mock("revisions/bedding_sleep.r1.json"));
    let output = run(backward)?;
    assert_eq!(output.status.code(), Some(1));
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("violation version: decreased from 4 to 3"), "{text}");
    Ok(())
}

#[test]
fn cli_bump_updates_file_in_place() -> Result<()> {
    let dir = TempDir::new()?;
    let file = stage(dir.path(), "v1/bedding_sleep.json", "v1/bedding_sleep.json")?;

    let mut cmd = cli();
    cmd.arg("--root")
        .arg(dir.path())
        .arg("bump")
        .arg("bedding_sleep")
        .arg("--item")
        .arg("pillow-001")
        .arg("--date")
        .arg("2025-12-09");
    let output = run(cmd)?;
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let doc = load_document_from_path(&file)?;
    assert_eq!(doc.version, 4);
    assert_eq!(doc.last_updated, date(2025, 12, 9));
    assert_eq!(doc.item(&ItemId::from("pillow-001")).unwrap().item_version, 2);
    assert_eq!(doc.item(&ItemId::from("twin-xl-sheets")).unwrap().item_version, 1);

    let mut unknown = cli();
    unknown
        .arg("bump")
        .arg(&file)
        .arg("--item")
        .arg("lamp-404");
    let output = run(unknown)?;
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("lamp-404"));
    Ok(())
}

#[test]
fn cli_bump_with_several_items_counts_as_one_save() -> Result<()> {
    let dir = TempDir::new()?;
    let file = stage(dir.path(), "v1/bedding_sleep.json", "v1/bedding_sleep.json")?;

    let mut cmd = cli();
    cmd.arg("bump")
        .arg(&file)
        .arg("--item")
        .arg("pillow-001")
        .arg("--item")
        .arg("twin-xl-sheets")
        .arg("--item")
        .arg("pillow-001")
        .arg("--date")
        .arg("2025-12-09");
    let output = run(cmd)?;
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let previous = load_document_from_path(&mock("v1/bedding_sleep.json"))?;
    let doc = load_document_from_path(&file)?;
    assert_eq!(doc.version, previous.version + 1);
    assert_eq!(doc.item(&ItemId::from("pillow-001")).unwrap().item_version, 2);
    assert_eq!(doc.item(&ItemId::from("twin-xl-sheets")).unwrap().item_version, 2);

    let mut unknown = cli();
    unknown
        .arg("bump")
        .arg(&file)
        .arg("--item")
        .arg("pillow-001")
        .arg("--item")
        .arg("lamp-404");
    let output = run(unknown)?;
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(load_document_from_path(&file)?, doc);
    Ok(())
}

#[test]
fn cli_diff_accepts_two_saves_on_one_day() -> Result<()> {
    let dir = TempDir::new()?;
    let r2 = stage(dir.path(), "revisions/bedding_sleep.r2.json", "r2.json")?;
    let r3 = dir.path().join("r3.json");

    let pillow = ItemId::from("pillow-001");
    let mut next = load_document_from_path(&r2)?;
    next.item_mut(&pillow).unwrap().links[0].url =
        "https://www.amazon.com/dp/B0CHX1QZ7Z?tag=dormready-20".to_string();
    let same_day = next.last_updated;
    record_edit(&mut next, &pillow, same_day)?;
    affiliate_links::save_document(&r3, &next)?;

    let mut cmd = cli();
    cmd.arg("diff").arg(&r2).arg(&r3);
    let output = run(cmd)?;
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "{text}");
    assert!(!text.contains("violation"), "{text}");
    Ok(())
}

#[test]
fn cli_url_and_stale() -> Result<()> {
    let mut url = cli();
    url.arg("url")
        .arg("bedding_sleep")
        .arg("--base")
        .arg("https://links.example.org/catalog");
    let output = run(url)?;
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "https://links.example.org/catalog/v1/bedding_sleep.json"
    );

    let mut stale = cli();
    stale
        .arg("stale")
        .arg(mock("revisions/bedding_sleep.r1.json"))
        .arg(mock("revisions/bedding_sleep.r2.json"));
    let output = run(stale)?;
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "pillow-001");
    Ok(())
}
