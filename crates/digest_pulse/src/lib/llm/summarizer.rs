use std::{fmt::Display, future::Future};

use digest_datastore::Transcript;

use crate::criteria::LengthBounds;

pub trait Summarizer {
    /// Token budget left for the transcript once prompt and completion are accounted for
    const CONTEXT_WINDOW_LIMIT: usize = 128_000 - 18_000;
    const SUMMARIZER_MODEL: &str;

    type Error: Display + Send;

    fn summarize(
        &self,
        transcript: &Transcript,
        bounds: LengthBounds,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send;
}
