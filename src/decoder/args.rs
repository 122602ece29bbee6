//! Decoder argument schema.
//!
//! [`ArgSchema`] is the immutable table of options the decoder understands,
//! each with a type and an optional default.  [`ArgSchema::recognizer`]
//! returns the table used for live microphone recognition.
//!
//! The schema is a plain value handed to
//! [`crate::session::ConfigurationBuilder`]; nothing reads it through a
//! global.

use std::fmt;

// ---------------------------------------------------------------------------
// ArgKind
// ---------------------------------------------------------------------------

/// Value type of a decoder option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    String,
    Float,
    Integer,
    Boolean,
}

impl ArgKind {
    /// Parse `raw` as a value of this kind.
    ///
    /// Booleans accept `yes`/`no`, `true`/`false` and `1`/`0` in any case.
    ///
    /// ```
    /// use speech_recognizer::decoder::{ArgKind, ArgValue};
    ///
    /// assert_eq!(ArgKind::Boolean.parse("YES"), Some(ArgValue::Bool(true)));
    /// assert_eq!(ArgKind::Float.parse("1e-20"), Some(ArgValue::Float(1e-20)));
    /// assert_eq!(ArgKind::Integer.parse("abc"), None);
    /// ```
    pub fn parse(self, raw: &str) -> Option<ArgValue> {
        match self {
            ArgKind::String => Some(ArgValue::Str(raw.to_string())),
            ArgKind::Float => raw.trim().parse().ok().map(ArgValue::Float),
            ArgKind::Integer => raw.trim().parse().ok().map(ArgValue::Int),
            ArgKind::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
                "yes" | "true" | "1" => Some(ArgValue::Bool(true)),
                "no" | "false" | "0" => Some(ArgValue::Bool(false)),
                _ => None,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// ArgValue
// ---------------------------------------------------------------------------

/// A typed option value held by a [`crate::decoder::DecoderConfig`].
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Str(String),
    Float(f64),
    Int(i64),
    Bool(bool),
}

impl ArgValue {
    pub fn kind(&self) -> ArgKind {
        match self {
            ArgValue::Str(_) => ArgKind::String,
            ArgValue::Float(_) => ArgKind::Float,
            ArgValue::Int(_) => ArgKind::Integer,
            ArgValue::Bool(_) => ArgKind::Boolean,
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Str(s) => f.write_str(s),
            ArgValue::Float(v) => write!(f, "{v}"),
            ArgValue::Int(v) => write!(f, "{v}"),
            ArgValue::Bool(true) => f.write_str("yes"),
            ArgValue::Bool(false) => f.write_str("no"),
        }
    }
}

// ---------------------------------------------------------------------------
// ArgSpec
// ---------------------------------------------------------------------------

/// Definition of a single decoder option.
#[derive(Debug, Clone, Copy)]
pub struct ArgSpec {
    /// Option name including the leading dash (e.g. `"-hmm"`).
    pub name: &'static str,
    pub kind: ArgKind,
    /// Default in textual form, parsed with [`ArgKind::parse`].
    pub default: Option<&'static str>,
    pub doc: &'static str,
}

// ---------------------------------------------------------------------------
// Well-known option names
// ---------------------------------------------------------------------------

pub const HMM: &str = "-hmm";
pub const SAMPLE_RATE: &str = "-samprate";
pub const REMOVE_NOISE: &str = "-remove_noise";
pub const KWS_THRESHOLD: &str = "-kws_threshold";
pub const LOG_FILE: &str = "-logfn";
pub const ARG_FILE: &str = "-argfile";
pub const INPUT_DEVICE: &str = "-adcdev";
pub const INPUT_MIC: &str = "-inmic";

const RECOGNIZER_ARGS: &[ArgSpec] = &[
    ArgSpec {
        name: HMM,
        kind: ArgKind::String,
        default: None,
        doc: "Directory containing acoustic model files.",
    },
    ArgSpec {
        name: "-dict",
        kind: ArgKind::String,
        default: None,
        doc: "Main pronunciation dictionary (lexicon) input file.",
    },
    ArgSpec {
        name: "-lm",
        kind: ArgKind::String,
        default: None,
        doc: "Word trigram language model input file.",
    },
    ArgSpec {
        name: "-jsgf",
        kind: ArgKind::String,
        default: None,
        doc: "JSGF grammar file.",
    },
    ArgSpec {
        name: "-kws",
        kind: ArgKind::String,
        default: None,
        doc: "File with keyphrases to spot, one per line.",
    },
    ArgSpec {
        name: "-keyphrase",
        kind: ArgKind::String,
        default: None,
        doc: "Keyphrase to spot.",
    },
    ArgSpec {
        name: KWS_THRESHOLD,
        kind: ArgKind::Float,
        default: Some("1e-30"),
        doc: "Threshold for p(hyp)/p(alternatives) ratio.",
    },
    ArgSpec {
        name: SAMPLE_RATE,
        kind: ArgKind::Float,
        default: Some("16000"),
        doc: "Sampling rate.",
    },
    ArgSpec {
        name: REMOVE_NOISE,
        kind: ArgKind::Boolean,
        default: Some("yes"),
        doc: "Remove noise using spectral subtraction.",
    },
    ArgSpec {
        name: "-vad_postspeech",
        kind: ArgKind::Integer,
        default: Some("50"),
        doc: "Num of silence frames to keep after from speech to silence.",
    },
    ArgSpec {
        name: LOG_FILE,
        kind: ArgKind::String,
        default: None,
        doc: "File to write log messages in.",
    },
    ArgSpec {
        name: ARG_FILE,
        kind: ArgKind::String,
        default: None,
        doc: "Argument file giving extra arguments.",
    },
    ArgSpec {
        name: INPUT_DEVICE,
        kind: ArgKind::String,
        default: None,
        doc: "Name of audio device to use for input.",
    },
    ArgSpec {
        name: "-infile",
        kind: ArgKind::String,
        default: None,
        doc: "Audio file to transcribe.",
    },
    ArgSpec {
        name: INPUT_MIC,
        kind: ArgKind::Boolean,
        default: Some("no"),
        doc: "Transcribe audio from microphone.",
    },
    ArgSpec {
        name: "-time",
        kind: ArgKind::Boolean,
        default: Some("no"),
        doc: "Print word times in file transcription.",
    },
];

// ---------------------------------------------------------------------------
// ArgSchema
// ---------------------------------------------------------------------------

/// Immutable set of option definitions.
#[derive(Debug, Clone)]
pub struct ArgSchema {
    specs: Vec<ArgSpec>,
}

impl ArgSchema {
    pub fn new(specs: Vec<ArgSpec>) -> Self {
        Self { specs }
    }

    /// Options for continuous microphone recognition.
    pub fn recognizer() -> Self {
        Self::new(RECOGNIZER_ARGS.to_vec())
    }

    /// Look up an option by name (with leading dash).
    pub fn spec(&self, name: &str) -> Option<&ArgSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn specs(&self) -> &[ArgSpec] {
        &self.specs
    }
}

impl Default for ArgSchema {
    fn default() -> Self {
        Self::recognizer()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
