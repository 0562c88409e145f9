use connectors::{
    check::{CheckService, SpeedyIndexClient},
    file::csv::workbook::{CsvWorkbook, write_sheet_file, write_table},
};
use engine_config::settings::{
    CheckerSettings, RunMode, validated::ValidatedSettings, validator::SettingsValidator,
};
use engine_runtime::execution::executor::{RunOutput, run};
use model::{
    core::{
        identifiers::{Column, RowId},
        value::CellValue,
    },
    records::sheet::Sheet,
};
use serde_json::{Value, json};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio_util::sync::CancellationToken;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, body_partial_json, method, path},
};

pub const API_KEY: &str = "test-key";
pub const OUTPUT_COLUMN: Column = Column::nth(4);

/// Rows of the "Backlinks" export: header at row 3, one invalid and one
/// duplicated URL below it.
pub const BACKLINKS: &[&[&str]] = &[
    &["SEO export"],
    &[],
    &["Anchor", "Referring Page URL", "DR"],
    &["a", "https://a.test", "40"],
    &["b", "not-a-url", "12"],
    &["c", "https://a.test", "40"],
];

pub fn sheet(name: &str, rows: &[&[&str]]) -> Sheet {
    Sheet::new(
        name,
        rows.iter()
            .map(|row| row.iter().map(|cell| CellValue::parse(cell)).collect())
            .collect(),
    )
}

/// Sheet with the default header followed by one URL cell per row.
pub fn url_sheet(name: &str, urls: &[&str]) -> Sheet {
    let mut rows: Vec<Vec<CellValue>> = vec![vec![
        CellValue::from("Anchor"),
        CellValue::from("Referring Page URL"),
    ]];
    rows.extend(
        urls.iter()
            .map(|url| vec![CellValue::from("row"), CellValue::parse(url)]),
    );
    Sheet::new(name, rows)
}

/// Writes `sheets` as a directory workbook, one `.csv` per sheet.
pub fn write_workbook(dir: &Path, sheets: &[Sheet]) -> PathBuf {
    let root = dir.join("input");
    std::fs::create_dir_all(&root).expect("create workbook dir");
    for sheet in sheets {
        write_sheet_file(sheet, &root.join(format!("{}.csv", sheet.name())))
            .expect("write sheet");
    }
    root
}

/// Writes one sheet verbatim, as exported by a spreadsheet application.
pub fn write_raw_sheet(dir: &Path, name: &str, content: &str) -> PathBuf {
    let root = dir.join("input");
    std::fs::create_dir_all(&root).expect("create workbook dir");
    std::fs::write(root.join(format!("{name}.csv")), content).expect("write sheet");
    root
}

pub fn read_output(path: &Path, sheet: &str) -> Sheet {
    CsvWorkbook::open(path)
        .and_then(|workbook| workbook.read_sheet(sheet))
        .expect("read output sheet")
}

pub fn output_cell(sheet: &Sheet, row: usize) -> CellValue {
    sheet.cell(RowId::new(row), OUTPUT_COLUMN).clone()
}

pub fn settings(server: &MockServer, mode: RunMode, max_attempts: u32) -> ValidatedSettings {
    SettingsValidator::validate(CheckerSettings {
        base_url: format!("{}/v2", server.uri()),
        poll_interval_ms: 10,
        max_attempts,
        mode,
        request_timeout_secs: 5,
        ..Default::default()
    })
    .expect("valid settings")
}

pub fn client(settings: &ValidatedSettings) -> Arc<dyn CheckService> {
    Arc::new(SpeedyIndexClient::new(settings.client_config(API_KEY)).expect("build client"))
}

/// Loads the workbook, runs the check and writes the result to `output`.
pub async fn run_check(
    input: &Path,
    output: &Path,
    selection: &[&str],
    settings: &ValidatedSettings,
) -> RunOutput {
    let table = CsvWorkbook::open(input)
        .and_then(|workbook| workbook.load_table())
        .expect("load workbook");
    let selection: Vec<String> = selection.iter().map(|s| s.to_string()).collect();

    let result = run(
        table,
        &selection,
        client(settings),
        settings,
        CancellationToken::new(),
    )
    .await
    .expect("run check");

    write_table(&result.table, output).expect("write output");
    result
}

pub async fn mount_create(server: &MockServer, title: &str, response: Value, expect: u64) {
    Mock::given(method("POST"))
        .and(path("/v2/task/google/checker/create"))
        .and(body_partial_json(json!({ "title": title })))
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .expect(expect)
        .mount(server)
        .await;
}

pub async fn mount_status(server: &MockServer, task_ids: &[&str], completed: bool) {
    let result: Vec<Value> = task_ids
        .iter()
        .map(|id| json!({"id": id, "is_completed": completed, "processed_count": 1, "size": 2}))
        .collect();

    Mock::given(method("POST"))
        .and(path("/v2/task/google/checker/status"))
        .and(body_json(json!({ "task_ids": task_ids })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": result })))
        .mount(server)
        .await;
}

pub async fn mount_report(server: &MockServer, task_id: &str, indexed: &[&str]) {
    Mock::given(method("POST"))
        .and(path("/v2/task/google/checker/report"))
        .and(body_json(json!({ "task_id": task_id })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": { "indexed_links": indexed }
        })))
        .mount(server)
        .await;
}

/// Any status request; useful with `expect` to assert call counts.
pub fn any_status() -> wiremock::MockBuilder {
    Mock::given(method("POST")).and(path("/v2/task/google/checker/status"))
}
