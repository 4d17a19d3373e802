use crate::{
    report::Notifier,
    yt::{ChannelSource, MediaSource, TextSource},
    RunCoordinator, Summarizer,
};

/// Assembles a [`RunCoordinator`] one collaborator at a time; `build` only
/// becomes available once all five are set.
pub struct RunCoordinatorBuilder<C = (), M = (), T = (), S = (), N = ()> {
    channel_source: C,
    media_source: M,
    text_source: T,
    summarizer: S,
    notifier: N,
}

impl Default for RunCoordinatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RunCoordinatorBuilder {
    pub fn new() -> Self {
        Self {
            channel_source: (),
            media_source: (),
            text_source: (),
            summarizer: (),
            notifier: (),
        }
    }
}

impl<C, M, T, S, N> RunCoordinatorBuilder<C, M, T, S, N> {
    pub fn channel_source<C2: ChannelSource + Send + Sync + 'static>(
        self,
        channel_source: C2,
    ) -> RunCoordinatorBuilder<C2, M, T, S, N> {
        RunCoordinatorBuilder {
            channel_source,
            media_source: self.media_source,
            text_source: self.text_source,
            summarizer: self.summarizer,
            notifier: self.notifier,
        }
    }

    pub fn media_source<M2: MediaSource + Send + Sync + 'static>(
        self,
        media_source: M2,
    ) -> RunCoordinatorBuilder<C, M2, T, S, N> {
        RunCoordinatorBuilder {
            channel_source: self.channel_source,
            media_source,
            text_source: self.text_source,
            summarizer: self.summarizer,
            notifier: self.notifier,
        }
    }

    pub fn text_source<T2: TextSource + Send + Sync + 'static>(
        self,
        text_source: T2,
    ) -> RunCoordinatorBuilder<C, M, T2, S, N> {
        RunCoordinatorBuilder {
            channel_source: self.channel_source,
            media_source: self.media_source,
            text_source,
            summarizer: self.summarizer,
            notifier: self.notifier,
        }
    }

    pub fn summarizer<S2: Summarizer + Send + Sync + 'static>(
        self,
        summarizer: S2,
    ) -> RunCoordinatorBuilder<C, M, T, S2, N> {
        RunCoordinatorBuilder {
            channel_source: self.channel_source,
            media_source: self.media_source,
            text_source: self.text_source,
            summarizer,
            notifier: self.notifier,
        }
    }

    pub fn notifier<N2: Notifier + Send + Sync + 'static>(
        self,
        notifier: N2,
    ) -> RunCoordinatorBuilder<C, M, T, S, N2> {
        RunCoordinatorBuilder {
            channel_source: self.channel_source,
            media_source: self.media_source,
            text_source: self.text_source,
            summarizer: self.summarizer,
            notifier,
        }
    }
}

impl<C, M, T, S, N> RunCoordinatorBuilder<C, M, T, S, N>
where
    C: ChannelSource + Send + Sync + 'static,
    M: MediaSource + Send + Sync + 'static,
    T: TextSource + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    pub fn build(self) -> RunCoordinator<C, M, T, S, N> {
        RunCoordinator::new(
            self.channel_source,
            self.media_source,
            self.text_source,
            self.summarizer,
            self.notifier,
        )
    }
}
