//! 다중 소스 시간순 병합
//!
//! N개의 소스를 min-heap으로 병합하여 타임스탬프가 단조 증가하는 단일
//! 스트림을 만듭니다. 힙 키는 `(타임스탬프, 소스 인덱스)`이므로 동일
//! 시각의 레코드는 입력 소스 순서로 나옵니다 — 전체 순서는 결정적입니다.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use negalog_core::types::ParsedRecord;

use super::RecordSource;
use crate::error::AnalysisError;

/// 힙 항목 — 레코드와 그 출처 소스 인덱스
struct HeapEntry {
    record: ParsedRecord,
    source_idx: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.record.timestamp == other.record.timestamp && self.source_idx == other.source_idx
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.record
            .timestamp
            .cmp(&other.record.timestamp)
            .then_with(|| self.source_idx.cmp(&other.source_idx))
    }
}

/// 병합 소스
///
/// 여러 [`RecordSource`]를 하나의 시간순 스트림으로 합칩니다. 첫 pull에서
/// 각 소스로부터 레코드 하나씩을 읽어 힙을 채우고(빈 소스는 제외), 이후
/// pop할 때마다 같은 소스에서 다음 레코드를 보충합니다. 한 소스의 EOF는
/// 활성 소스 집합만 줄일 뿐 힙이 빌 때까지 스트림을 끝내지 않습니다.
pub struct MergedSource {
    sources: Vec<Box<dyn RecordSource>>,
    heap: BinaryHeap<Reverse<HeapEntry>>,
    primed: bool,
}

impl MergedSource {
    /// 새 병합 소스를 생성합니다. 소스 순서가 동시각 tie-break 순서가 됩니다.
    pub fn new(sources: Vec<Box<dyn RecordSource>>) -> Self {
        Self {
            sources,
            heap: BinaryHeap::new(),
            primed: false,
        }
    }

    /// 각 소스에서 첫 레코드를 읽어 힙을 채웁니다.
    fn prime(&mut self) -> Result<(), AnalysisError> {
        for (source_idx, source) in self.sources.iter_mut().enumerate() {
            if let Some(record) = source.next_record()? {
                self.heap.push(Reverse(HeapEntry { record, source_idx }));
            }
        }
        Ok(())
    }
}

impl RecordSource for MergedSource {
    fn next_record(&mut self) -> Result<Option<ParsedRecord>, AnalysisError> {
        if !self.primed {
            self.primed = true;
            self.prime()?;
        }

        let Some(Reverse(entry)) = self.heap.pop() else {
            return Ok(None);
        };

        // 꺼낸 소스에서 다음 레코드를 보충
        if let Some(record) = self.sources[entry.source_idx].next_record()? {
            self.heap.push(Reverse(HeapEntry {
                record,
                source_idx: entry.source_idx,
            }));
        }

        Ok(Some(entry.record))
    }

    fn close(&mut self) -> Result<(), AnalysisError> {
        let mut first_err = None;
        for source in &mut self.sources {
            if let Err(e) = source.close() {
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
