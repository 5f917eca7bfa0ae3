use std::fmt;

pub const MIN_RESULTS: u32 = 1;
pub const MAX_RESULTS: u32 = 500;
pub const DEFAULT_MAX_RESULTS: u32 = 50;

/// Upper bound on the number of images a crawl may collect.
///
/// The only way to build one is through clamping, so a value of this type is
/// always within `[MIN_RESULTS, MAX_RESULTS]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MaxResults(u32);

impl MaxResults {
    /// Clamps raw user input into the accepted range.
    pub fn clamped(raw: i64) -> Self {
        let bounded = raw.clamp(i64::from(MIN_RESULTS), i64::from(MAX_RESULTS));
        // Lossless: the value was just bounded by two u32 constants.
        Self(bounded as u32)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for MaxResults {
    fn default() -> Self {
        Self(DEFAULT_MAX_RESULTS)
    }
}

impl From<u32> for MaxResults {
    fn from(raw: u32) -> Self {
        Self::clamped(i64::from(raw))
    }
}

impl fmt::Display for MaxResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Submission channel of a crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Text,
    Upload,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Text => write!(f, "text"),
            Mode::Upload => write!(f, "upload"),
        }
    }
}

/// A reference image staged for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct StagedImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl StagedImage {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}

impl fmt::Debug for StagedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagedImage")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// What the user asked for: the form contents at the moment of submission.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CrawlInput {
    pub mode: Mode,
    pub keyword: String,
    pub image: Option<StagedImage>,
    pub max_results: MaxResults,
}

impl CrawlInput {
    pub fn keyword(keyword: impl Into<String>, max_results: MaxResults) -> Self {
        Self {
            mode: Mode::Text,
            keyword: keyword.into(),
            image: None,
            max_results,
        }
    }

    pub fn upload(image: StagedImage, max_results: MaxResults) -> Self {
        Self {
            mode: Mode::Upload,
            keyword: String::new(),
            image: Some(image),
            max_results,
        }
    }

    /// Checks the submission preconditions for the selected mode.
    ///
    /// Only the field belonging to `mode` is consulted; a keyword typed before
    /// switching to upload mode never leaks into an upload submission.
    pub fn check(&self) -> Result<(), ValidationError> {
        match self.mode {
            Mode::Text if self.keyword.trim().is_empty() => Err(ValidationError::EmptyKeyword),
            Mode::Upload if self.image.is_none() => Err(ValidationError::MissingImage),
            Mode::Text | Mode::Upload => Ok(()),
        }
    }

    /// Builds the query to submit, with the keyword trimmed.
    pub fn validate(&self) -> Result<Query, ValidationError> {
        self.check()?;
        match (&self.mode, &self.image) {
            (Mode::Upload, Some(image)) => Ok(Query::Image(image.clone())),
            (Mode::Upload, None) => Err(ValidationError::MissingImage),
            (Mode::Text, _) => Ok(Query::Keyword(self.keyword.trim().to_owned())),
        }
    }
}

/// A validated query; exactly one of keyword or image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Keyword(String),
    Image(StagedImage),
}

impl Query {
    pub fn mode(&self) -> Mode {
        match self {
            Query::Keyword(_) => Mode::Text,
            Query::Image(_) => Mode::Upload,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    EmptyKeyword,
    MissingImage,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyKeyword => write!(f, "keyword is empty"),
            ValidationError::MissingImage => write!(f, "no image staged for upload"),
        }
    }
}

impl std::error::Error for ValidationError {}
