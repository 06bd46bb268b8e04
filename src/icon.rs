use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

pub const SVG_MIME: &str = "image/svg+xml";
const CURRENT_COLOR_TOKEN: &str = "currentColor";

#[derive(Debug, Error)]
pub enum IconError {
    #[error("icon `{name}` has unsupported type {mime} (expected {accept})")]
    UnsupportedType {
        name: String,
        mime: String,
        accept: &'static str,
    },
    #[error("svg icon `{name}` is not valid utf-8")]
    InvalidSvg {
        name: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

pub type IconResult<T> = std::result::Result<T, IconError>;

/// An uploaded icon file as handed over by the file picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl IconFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes: bytes.into(),
        }
    }

    pub fn is_svg(&self) -> bool {
        self.mime == SVG_MIME
    }
}

/// Which files the icon picker accepts for an entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconAccept {
    SvgOnly,
    AnyImage,
}

impl IconAccept {
    pub const fn as_attr(self) -> &'static str {
        match self {
            Self::SvgOnly => SVG_MIME,
            Self::AnyImage => "image/*",
        }
    }

    pub fn check(self, file: &IconFile) -> IconResult<()> {
        let accepted = match self {
            Self::SvgOnly => file.is_svg(),
            Self::AnyImage => file.mime.starts_with("image/"),
        };
        if accepted {
            Ok(())
        } else {
            Err(IconError::UnsupportedType {
                name: file.name.clone(),
                mime: file.mime.clone(),
                accept: self.as_attr(),
            })
        }
    }
}

/// Converts an uploaded icon into a `data:` URL usable as an image source.
/// SVG icons have `currentColor` swapped for the dashboard theme color so
/// they render the same way as server-stored icons.
pub fn icon_to_data_url(file: &IconFile, theme_color: &str) -> IconResult<String> {
    if file.is_svg() {
        let svg = String::from_utf8(file.bytes.clone()).map_err(|source| IconError::InvalidSvg {
            name: file.name.clone(),
            source,
        })?;
        let themed = svg.replace(CURRENT_COLOR_TOKEN, theme_color);
        return Ok(format!("data:{SVG_MIME};base64,{}", STANDARD.encode(themed)));
    }

    Ok(format!("data:{};base64,{}", file.mime, STANDARD.encode(&file.bytes)))
}
