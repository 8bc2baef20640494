//! 파일 기반 레코드 소스
//!
//! 주어진 파일들을 호출자가 지정한 순서대로 한 줄씩 읽으며, 타임스탬프가
//! 추출된 라인만 [`ParsedRecord`]로 내보냅니다. 타임스탬프가 없는 라인은
//! 조용히 건너뜁니다 (에러 아님).

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use negalog_core::types::ParsedRecord;

use super::RecordSource;
use crate::error::AnalysisError;
use crate::timestamp::TimestampExtractor;

/// 기본 최대 라인 크기 (1 MiB). 초과하는 라인은 소스 에러가 됩니다.
pub const DEFAULT_MAX_LINE_LEN: usize = 1024 * 1024;

/// 파일 레코드 소스
///
/// lazy하게 동작합니다: 파일은 첫 pull에서 열리고, 소진되면 다음 파일로
/// 넘어갑니다. 줄 번호는 파일별 1-기반이며 건너뛴 라인도 셉니다.
pub struct FileSource {
    /// 읽을 파일 목록 (호출자 순서 유지)
    files: Vec<PathBuf>,
    /// 타임스탬프 추출기
    extractor: TimestampExtractor,
    /// 최대 라인 크기 (바이트)
    max_line_len: usize,
    /// 취소 신호 — 매 pull 전에 확인
    cancel: CancellationToken,

    reader: Option<BufReader<File>>,
    current_source: String,
    current_line: u64,
    next_file: usize,
}

impl FileSource {
    /// 새 파일 소스를 생성합니다.
    pub fn new(files: Vec<PathBuf>, extractor: TimestampExtractor) -> Self {
        Self {
            files,
            extractor,
            max_line_len: DEFAULT_MAX_LINE_LEN,
            cancel: CancellationToken::new(),
            reader: None,
            current_source: String::new(),
            current_line: 0,
            next_file: 0,
        }
    }

    /// 외부 취소 토큰을 연결합니다.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// 최대 라인 크기를 설정합니다.
    pub fn with_max_line_len(mut self, max_line_len: usize) -> Self {
        self.max_line_len = max_line_len;
        self
    }

    /// 다음 파일을 엽니다. 더 이상 파일이 없으면 `Ok(false)`.
    fn open_next_file(&mut self) -> Result<bool, AnalysisError> {
        let Some(path) = self.files.get(self.next_file) else {
            return Ok(false);
        };

        let file = File::open(path).map_err(|e| AnalysisError::Source {
            path: path.display().to_string(),
            reason: format!("failed to open: {e}"),
        })?;

        self.current_source = path.display().to_string();
        self.current_line = 0;
        self.reader = Some(BufReader::new(file));
        self.next_file += 1;
        debug!(path = %self.current_source, "opened log source");
        Ok(true)
    }
}

impl RecordSource for FileSource {
    fn next_record(&mut self) -> Result<Option<ParsedRecord>, AnalysisError> {
        loop {
            if self.cancel.is_cancelled() {
                return Err(AnalysisError::Cancelled);
            }

            if self.reader.is_none() && !self.open_next_file()? {
                return Ok(None);
            }
            let Some(reader) = self.reader.as_mut() else {
                continue;
            };

            // 라인 크기 제한을 넘어서 읽지 않도록 take로 감싸서 읽는다
            let mut buf = String::new();
            let limit = self.max_line_len as u64 + 1;
            let bytes_read = reader
                .by_ref()
                .take(limit)
                .read_line(&mut buf)
                .map_err(|e| AnalysisError::Source {
                    path: self.current_source.clone(),
                    reason: format!("read failed: {e}"),
                })?;

            if bytes_read == 0 {
                // 현재 파일 소진, 다음 파일로
                self.reader = None;
                continue;
            }

            self.current_line += 1;

            if buf.len() > self.max_line_len && !buf.ends_with('\n') {
                return Err(AnalysisError::LineTooLong {
                    path: self.current_source.clone(),
                    line_num: self.current_line,
                    limit: self.max_line_len,
                });
            }

            let line = buf.trim_end_matches('\n').trim_end_matches('\r');

            match self.extractor.extract(line) {
                Some(timestamp) => {
                    return Ok(Some(ParsedRecord {
                        raw: line.to_owned(),
                        timestamp,
                        source: self.current_source.clone(),
                        line_num: self.current_line,
                    }));
                }
                // 타임스탬프가 없는 라인은 조용히 건너뜀
                None => continue,
            }
        }
    }

    fn close(&mut self) -> Result<(), AnalysisError> {
        self.reader = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn bracketed_extractor() -> TimestampExtractor {
        TimestampExtractor::new(
            Regex::new(r"^\[(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})\]").unwrap(),
            "%Y-%m-%d %H:%M:%S",
        )
    }

    fn write_log(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file.flush().unwrap();
        file
    }

    fn drain(source: &mut FileSource) -> Vec<ParsedRecord> {
        let mut records = Vec::new();
        while let Some(record) = source.next_record().unwrap() {
            records.push(record);
        }
        records
    }

    #[test]
    fn reads_records_in_file_order() {
        let file = write_log(&[
            "[2024-01-15 10:00:00] first",
            "[2024-01-15 10:00:01] second",
            "[2024-01-15 10:00:02] third",
        ]);
        let mut source = FileSource::new(vec![file.path().to_owned()], bracketed_extractor());

        let records = drain(&mut source);
        assert_eq!(records.len(), 3);
        assert!(records[0].raw.ends_with("first"));
        assert!(records[2].raw.ends_with("third"));
        assert!(records[0].timestamp < records[1].timestamp);
    }

    #[test]
    fn line_numbers_are_one_based_and_count_skipped_lines() {
        let file = write_log(&[
            "no timestamp on this line",
            "[2024-01-15 10:00:00] parsed",
        ]);
        let mut source = FileSource::new(vec![file.path().to_owned()], bracketed_extractor());

        let records = drain(&mut source);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].line_num, 2);
    }

    #[test]
    fn skips_unparseable_lines_silently() {
        let file = write_log(&[
            "[2024-01-15 10:00:00] ok",
            "garbage",
            "",
            "[bad-date] also skipped",
            "[2024-01-15 10:00:05] ok again",
        ]);
        let mut source = FileSource::new(vec![file.path().to_owned()], bracketed_extractor());

        let records = drain(&mut source);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].line_num, 5);
    }

    #[test]
    fn consumes_multiple_files_in_caller_order() {
        let first = write_log(&["[2024-01-15 10:00:00] from first"]);
        let second = write_log(&["[2024-01-15 09:00:00] from second"]);
        let mut source = FileSource::new(
            vec![first.path().to_owned(), second.path().to_owned()],
            bracketed_extractor(),
        );

        let records = drain(&mut source);
        assert_eq!(records.len(), 2);
        // 파일 소스는 정렬하지 않고 호출자 순서를 유지한다
        assert!(records[0].raw.ends_with("from first"));
        assert!(records[1].raw.ends_with("from second"));
        assert_eq!(records[0].source, first.path().display().to_string());
    }

    #[test]
    fn missing_file_is_a_source_error() {
        let mut source = FileSource::new(
            vec![PathBuf::from("/nonexistent/negalog-test.log")],
            bracketed_extractor(),
        );
        let err = source.next_record().unwrap_err();
        assert!(matches!(err, AnalysisError::Source { .. }));
        assert!(err.to_string().contains("negalog-test.log"));
    }

    #[test]
    fn oversized_line_fails_with_location() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[2024-01-15 10:00:00] fine").unwrap();
        writeln!(file, "[2024-01-15 10:00:01] {}", "x".repeat(256)).unwrap();
        file.flush().unwrap();

        let mut source = FileSource::new(vec![file.path().to_owned()], bracketed_extractor())
            .with_max_line_len(128);

        assert!(source.next_record().unwrap().is_some());
        let err = source.next_record().unwrap_err();
        match err {
            AnalysisError::LineTooLong { line_num, limit, .. } => {
                assert_eq!(line_num, 2);
                assert_eq!(limit, 128);
            }
            other => panic!("expected LineTooLong, got {other}"),
        }
    }

    #[test]
    fn line_at_exact_limit_is_accepted() {
        let mut file = NamedTempFile::new().unwrap();
        let prefix = "[2024-01-15 10:00:00] ";
        let line = format!("{prefix}{}", "y".repeat(128 - prefix.len()));
        assert_eq!(line.len(), 128);
        writeln!(file, "{line}").unwrap();
        file.flush().unwrap();

        let mut source = FileSource::new(vec![file.path().to_owned()], bracketed_extractor())
            .with_max_line_len(128);
        assert!(source.next_record().unwrap().is_some());
        assert!(source.next_record().unwrap().is_none());
    }

    #[test]
    fn cancellation_observed_before_pull() {
        let file = write_log(&["[2024-01-15 10:00:00] line"]);
        let cancel = CancellationToken::new();
        let mut source = FileSource::new(vec![file.path().to_owned()], bracketed_extractor())
            .with_cancellation(cancel.clone());

        cancel.cancel();
        assert!(matches!(
            source.next_record(),
            Err(AnalysisError::Cancelled)
        ));
    }

    #[test]
    fn empty_file_list_yields_end_of_stream() {
        let mut source = FileSource::new(Vec::new(), bracketed_extractor());
        assert!(source.next_record().unwrap().is_none());
    }

    #[test]
    fn close_releases_current_file() {
        let file = write_log(&["[2024-01-15 10:00:00] line"]);
        let mut source = FileSource::new(vec![file.path().to_owned()], bracketed_extractor());
        assert!(source.next_record().unwrap().is_some());
        source.close().unwrap();
        assert!(source.reader.is_none());
    }
}
