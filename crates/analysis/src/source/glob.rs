//! glob 패턴 확장
//!
//! 설정의 `log_sources` 항목(경로 또는 glob 패턴)을 실제 파일 목록으로
//! 확장합니다. 어떤 파일과도 매칭되지 않은 패턴은 원문 그대로 유지하여,
//! 이후 파일 열기 단계의 에러 메시지가 해당 패턴을 지목할 수 있게 합니다.

use std::collections::HashSet;

use glob::glob;

use crate::error::AnalysisError;

/// 경로/glob 패턴 목록을 중복 제거된 정렬 파일 목록으로 확장합니다.
///
/// - 매칭된 경로는 한 번씩만 포함됩니다.
/// - 매칭되지 않은 패턴은 원문 그대로 한 번 포함됩니다.
/// - 결과는 사전순으로 정렬됩니다.
/// - 읽을 수 없는 디렉토리 항목은 건너뜁니다.
pub fn expand_globs(patterns: &[String]) -> Result<Vec<String>, AnalysisError> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();

    for pattern in patterns {
        let paths = glob(pattern).map_err(|e| AnalysisError::Source {
            path: pattern.clone(),
            reason: format!("invalid glob pattern: {e}"),
        })?;

        let mut matched_any = false;
        for path in paths.flatten() {
            matched_any = true;
            let path = path.to_string_lossy().into_owned();
            if seen.insert(path.clone()) {
                result.push(path);
            }
        }

        if !matched_any && seen.insert(pattern.clone()) {
            result.push(pattern.clone());
        }
    }

    result.sort();
    Ok(result)
}
