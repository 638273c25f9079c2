// ==========================================
// 数字仓储批量导入导出系统 - 源文件解析器
// ==========================================
// 支持: CSV (.csv)
// 约束: 结构性解析失败是致命错误,在建档前中止整个运行
// ==========================================

use crate::domain::entry::Row;
use crate::importer::error::{ImportError, ImportResult};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;

// ==========================================
// ParsedRows - 解析结果
// ==========================================
// headers 保持源文件列序,恢复文件回写时使用
#[derive(Debug, Clone, Default)]
pub struct ParsedRows {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

// ==========================================
// CsvParser
// ==========================================
pub struct CsvParser;

impl CsvParser {
    /// 解析 CSV 文件为有序行记录
    ///
    /// # 返回
    /// - Ok(ParsedRows): 表头 + 行记录（跳过全空白行）
    /// - Err: 文件缺失/格式不支持/结构性解析错误
    pub fn parse_to_rows(&self, file_path: &Path) -> ImportResult<ParsedRows> {
        let path = file_path;

        // 检查文件存在
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        // 检查扩展名
        if let Some(ext) = path.extension() {
            if !ext.eq_ignore_ascii_case("csv") {
                return Err(ImportError::UnsupportedFormat(
                    ext.to_string_lossy().to_string(),
                ));
            }
        }

        // 打开 CSV 文件
        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        // 读取表头
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        // 读取所有行
        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let mut row = Row::new();

            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    row.insert(header.clone(), value.trim().to_string());
                }
            }

            // 跳过完全空白的行
            if row.values().all(|v| v.is_empty()) {
                continue;
            }

            rows.push(row);
        }

        Ok(ParsedRows { headers, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn temp_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_csv_parser_valid_file() {
        let file = temp_csv("source_identifier,model,title\nc1,Collection,集合一\nw1,,作品一\n");

        let parser = CsvParser;
        let parsed = parser.parse_to_rows(file.path()).unwrap();

        assert_eq!(parsed.headers, vec!["source_identifier", "model", "title"]);
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].get("model"), Some(&"Collection".to_string()));
        assert_eq!(parsed.rows[1].get("title"), Some(&"作品一".to_string()));
    }

    #[test]
    fn test_csv_parser_file_not_found() {
        let parser = CsvParser;
        let result = parser.parse_to_rows(Path::new("non_existent.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_csv_parser_unsupported_extension() {
        let mut file = Builder::new().suffix(".xlsx").tempfile().unwrap();
        write!(file, "a,b\n1,2\n").unwrap();

        let parser = CsvParser;
        let result = parser.parse_to_rows(file.path());
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_csv_parser_skip_empty_rows() {
        let file = temp_csv("source_identifier,title\nw1,作品一\n,\nw2,作品二\n");

        let parser = CsvParser;
        let parsed = parser.parse_to_rows(file.path()).unwrap();

        // 应跳过空行
        assert_eq!(parsed.rows.len(), 2);
    }

    #[test]
    fn test_csv_parser_malformed_is_structural_error() {
        // 非法 UTF-8 字节 → 结构性解析错误
        let file = Builder::new().suffix(".csv").tempfile().unwrap();
        std::fs::write(file.path(), b"a,b\nx,\xff\xfe\n").unwrap();

        let parser = CsvParser;
        let result = parser.parse_to_rows(file.path());
        assert!(matches!(result, Err(ImportError::CsvParseError(_))));
    }
}
