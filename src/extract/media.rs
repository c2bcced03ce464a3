//! Tally of media blocks omitted from the reconstructed text.

/// Photo, video and iframe counters for one article body.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MediaTally {
    photos: usize,
    videos: usize,
    iframes: usize,
}

impl MediaTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_photo(&mut self) {
        self.photos += 1;
    }

    pub fn add_video(&mut self) {
        self.videos += 1;
    }

    pub fn add_iframe(&mut self) {
        self.iframes += 1;
    }

    pub fn photos(&self) -> usize {
        self.photos
    }

    pub fn videos(&self) -> usize {
        self.videos
    }

    pub fn iframes(&self) -> usize {
        self.iframes
    }

    pub fn is_empty(&self) -> bool {
        self.photos == 0 && self.videos == 0 && self.iframes == 0
    }

    /// `"2 photos, 1 video"` style clause, or an empty string when every
    /// counter is zero. Categories always appear in photo, video, iframe order.
    pub fn summarize(&self) -> String {
        [
            (self.photos, "photo"),
            (self.videos, "video"),
            (self.iframes, "iframe"),
        ]
        .into_iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, noun)| {
            if count == 1 {
                format!("{count} {noun}")
            } else {
                format!("{count} {noun}s")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tally_summarizes_to_nothing() {
        let tally = MediaTally::new();
        assert!(tally.is_empty());
        assert_eq!(tally.summarize(), "");
    }

    #[test]
    fn test_summary_counts_and_plurals() {
        let mut tally = MediaTally::new();
        tally.add_photo();
        tally.add_photo();
        tally.add_video();
        assert_eq!((tally.photos(), tally.videos(), tally.iframes()), (2, 1, 0));
        assert_eq!(tally.summarize(), "2 photos, 1 video");
    }

    #[test]
    fn test_summary_is_order_stable() {
        let mut a = MediaTally::new();
        a.add_iframe();
        a.add_photo();
        let mut b = MediaTally::new();
        b.add_photo();
        b.add_iframe();
        assert_eq!(a.summarize(), b.summarize());
        assert_eq!(a.summarize(), "1 photo, 1 iframe");
    }
}
