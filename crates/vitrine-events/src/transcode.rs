#![forbid(unsafe_code)]

#[derive(Clone, Debug, PartialEq)]
pub enum TranscodeEvent {
    Completed {
        source_bytes: u64,
        output_bytes: u64,
    },
    Failed {
        error: String,
    },
}
