// ==========================================
// 加密货币行情数据质量校验系统 - 文件解析器实现
// ==========================================
// 职责: 行情快照文件 → 原始表格（表头 + 文本行）
// 支持: CSV (.csv) / Excel (.xlsx/.xls) / JSON (.json)
// ==========================================

use crate::importer::error::{FeedError, FeedResult};
use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

// ==========================================
// RawTable - 原始表格
// ==========================================
// rows 中每行与 headers 按下标对齐（短行补空串）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// 追加一行（对齐到表头长度；完全空白的行跳过）
    pub fn push_row(&mut self, mut row: Vec<String>) {
        if row.iter().all(|v| v.is_empty()) {
            return;
        }
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ==========================================
// ParsedFile - 解析结果
// ==========================================
// JSON 保留原始载荷，由结构闸门判断是否为表格形状
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedFile {
    Table(RawTable),
    Json(Value),
}

// ==========================================
// FileParser Trait
// ==========================================
pub trait FileParser: Send + Sync {
    fn parse_to_raw_table(&self, file_path: &Path) -> FeedResult<RawTable>;
}

fn ensure_exists(path: &Path) -> FeedResult<()> {
    if !path.exists() {
        return Err(FeedError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_to_raw_table(&self, file_path: &Path) -> FeedResult<RawTable> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "csv" {
            return Err(FeedError::UnsupportedFormat(ext));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(FeedError::MalformedPayload(format!(
                "CSV 文件缺少表头: {}",
                file_path.display()
            )));
        }

        let mut table = RawTable::new(headers);
        for result in reader.records() {
            let record = result?;
            table.push_row(record.iter().map(|v| v.trim().to_string()).collect());
        }

        Ok(table)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
// 只读取第一个工作表，第一行为表头
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_to_raw_table(&self, file_path: &Path) -> FeedResult<RawTable> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "xlsx" && ext != "xls" {
            return Err(FeedError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| FeedError::ExcelParseError("Excel 文件无工作表".to_string()))?;
        let range = workbook.worksheet_range(&sheet_name)?;

        let mut rows = range.rows();
        let header_row = rows
            .next()
            .ok_or_else(|| FeedError::ExcelParseError("Excel 文件无表头行".to_string()))?;

        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        let mut table = RawTable::new(headers);
        for data_row in rows {
            table.push_row(
                data_row
                    .iter()
                    .map(|cell| cell.to_string().trim().to_string())
                    .collect(),
            );
        }

        Ok(table)
    }
}

// ==========================================
// JSON Parser 实现
// ==========================================
// 只做语法解析；载荷形状交给结构闸门
pub struct JsonParser;

impl JsonParser {
    pub fn parse_value(&self, file_path: &Path) -> FeedResult<Value> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "json" {
            return Err(FeedError::UnsupportedFormat(ext));
        }

        let file = File::open(file_path)?;
        let value = serde_json::from_reader(BufReader::new(file))?;
        Ok(value)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> FeedResult<ParsedFile> {
        let path = file_path.as_ref();

        match extension_of(path).as_str() {
            "csv" => CsvParser.parse_to_raw_table(path).map(ParsedFile::Table),
            "xlsx" | "xls" => ExcelParser.parse_to_raw_table(path).map(ParsedFile::Table),
            "json" => JsonParser.parse_value(path).map(ParsedFile::Json),
            other => Err(FeedError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn temp_file_with(suffix: &str, lines: &[&str]) -> tempfile::NamedTempFile {
        let mut temp_file = Builder::new().suffix(suffix).tempfile().unwrap();
        for line in lines {
            writeln!(temp_file, "{}", line).unwrap();
        }
        temp_file
    }

    #[test]
    fn test_csv_parser_valid_file() {
        let temp_file = temp_file_with(
            ".csv",
            &["id,symbol,current_price", "bitcoin,btc,50000", "ethereum,eth,3000"],
        );

        let table = CsvParser.parse_to_raw_table(temp_file.path()).unwrap();

        assert_eq!(table.headers, vec!["id", "symbol", "current_price"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0], vec!["bitcoin", "btc", "50000"]);
    }

    #[test]
    fn test_csv_parser_file_not_found() {
        let result = CsvParser.parse_to_raw_table(Path::new("non_existent.csv"));
        assert!(matches!(result, Err(FeedError::FileNotFound(_))));
    }

    #[test]
    fn test_csv_parser_skip_empty_rows_and_pad_short_rows() {
        let temp_file = temp_file_with(".csv", &["id,symbol", "bitcoin,btc", ",", "ethereum"]);

        let table = CsvParser.parse_to_raw_table(temp_file.path()).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[1], vec!["ethereum", ""]);
    }

    #[test]
    fn test_json_parser_keeps_raw_payload() {
        let temp_file = temp_file_with(".json", &[r#"{"status": "ok"}"#]);
        let parsed = UniversalFileParser.parse(temp_file.path()).unwrap();
        assert!(matches!(parsed, ParsedFile::Json(Value::Object(_))));
    }

    #[test]
    fn test_json_parser_rejects_broken_syntax() {
        let temp_file = temp_file_with(".json", &["[{\"id\": "]);
        let result = UniversalFileParser.parse(temp_file.path());
        assert!(matches!(result, Err(FeedError::JsonParseError(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        let temp_file = temp_file_with(".txt", &["id"]);
        let result = UniversalFileParser.parse(temp_file.path());
        assert!(matches!(result, Err(FeedError::UnsupportedFormat(ext)) if ext == "txt"));
    }
}
