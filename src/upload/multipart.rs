//! Request assembler
//!
//! Builds a `multipart/form-data` body holding exactly one file part. The
//! body is fully materialized before dispatch.
//!
//! # Wire format
//!
//! ```text
//! --<boundary>\r\n
//! Content-Disposition: form-data; name="file"; filename="<name>"\r\n
//! Content-Type: application/octet-stream\r\n
//! \r\n
//! <raw bytes>\r\n
//! --<boundary>--\r\n
//! ```

use super::UploadError;
use bytes::Bytes;
use std::fmt::Write;
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;

/// Form field name of the uploaded file
pub const FILE_FIELD: &str = "file";

/// Content type of the file part
pub const PART_CONTENT_TYPE: &str = "application/octet-stream";

/// Longest boundary allowed by RFC 2046
pub const MAX_BOUNDARY_LEN: usize = 70;

/// Assembly errors
#[derive(Error, Debug)]
pub enum AssemblyError {
    #[error("invalid boundary '{0}'")]
    InvalidBoundary(String),

    #[error("empty filename")]
    EmptyFilename,

    #[error("no open part")]
    NoOpenPart,

    #[error("only one part may be written")]
    PartAlreadyWritten,

    #[error("failed to read source: {0}")]
    Read(#[from] std::io::Error),
}

/// A finished multipart body and its boundary
#[derive(Debug, Clone)]
pub struct MultipartBody {
    boundary: String,
    body: Bytes,
}

impl MultipartBody {
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value for the request's `Content-Type` header
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.body
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.body
    }
}

/// Writer for a single-part multipart body
#[derive(Debug)]
pub struct MultipartWriter {
    boundary: String,
    buf: Vec<u8>,
    part_open: bool,
}

impl MultipartWriter {
    /// Create a writer with a random boundary
    pub fn new() -> Self {
        Self {
            boundary: uuid::Uuid::new_v4().simple().to_string(),
            buf: Vec::new(),
            part_open: false,
        }
    }

    /// Create a writer with a caller-chosen boundary
    pub fn with_boundary(boundary: &str) -> Result<Self, AssemblyError> {
        if !is_valid_boundary(boundary) {
            return Err(AssemblyError::InvalidBoundary(boundary.to_string()));
        }

        Ok(Self {
            boundary: boundary.to_string(),
            buf: Vec::new(),
            part_open: false,
        })
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Open the file part; later writes go into its content
    pub fn create_form_file(&mut self, field: &str, filename: &str) -> Result<(), AssemblyError> {
        if filename.is_empty() {
            return Err(AssemblyError::EmptyFilename);
        }
        if !self.buf.is_empty() {
            return Err(AssemblyError::PartAlreadyWritten);
        }

        let header = format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            self.boundary,
            escape_param(field),
            escape_param(filename),
            PART_CONTENT_TYPE
        );
        self.buf.extend_from_slice(header.as_bytes());
        self.part_open = true;
        Ok(())
    }

    /// Append bytes to the open part
    pub fn write_all(&mut self, data: &[u8]) -> Result<(), AssemblyError> {
        if !self.part_open {
            return Err(AssemblyError::NoOpenPart);
        }
        self.buf.extend_from_slice(data);
        Ok(())
    }

    /// Copy a whole stream into the open part, returning the bytes copied
    pub async fn copy_from<R>(&mut self, reader: &mut R) -> Result<u64, AssemblyError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        if !self.part_open {
            return Err(AssemblyError::NoOpenPart);
        }
        Ok(tokio::io::copy(reader, &mut self.buf).await?)
    }

    /// Write the closing boundary and hand back the body
    pub fn finish(mut self) -> Result<MultipartBody, AssemblyError> {
        if !self.part_open {
            return Err(AssemblyError::NoOpenPart);
        }

        self.buf
            .extend_from_slice(format!("\r\n--{}--\r\n", self.boundary).as_bytes());

        Ok(MultipartBody {
            boundary: self.boundary,
            body: Bytes::from(self.buf),
        })
    }
}

impl Default for MultipartWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Assemble a one-part body from `reader`, named `filename`
///
/// The copy races against `cancel`; a cancelled copy yields
/// [`UploadError::Cancelled`] and no body.
#[tracing::instrument(
    name = "upload.assemble",
    skip(reader, cancel),
    fields(
        upload.filename = %filename,
        upload.bytes = tracing::field::Empty
    ),
    err
)]
pub async fn assemble<R>(
    reader: &mut R,
    filename: &str,
    cancel: &CancellationToken,
) -> Result<MultipartBody, UploadError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut writer = MultipartWriter::new();
    writer.create_form_file(FILE_FIELD, filename)?;

    let copied = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(UploadError::Cancelled),
        copied = writer.copy_from(reader) => copied?,
    };

    tracing::Span::current().record("upload.bytes", copied);

    Ok(writer.finish()?)
}

/// Quote-safe form of a `Content-Disposition` parameter value
///
/// Follows HTML form submission: `"` is backslash-escaped, control
/// characters (CR and LF included) are percent-encoded so they can never end
/// the header line, and everything else, backslashes and non-ASCII text
/// included, is written as-is.
pub fn escape_param(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            c if c.is_ascii_control() => {
                let _ = write!(escaped, "%{:02X}", c as u32);
            }
            c => escaped.push(c),
        }
    }
    escaped
}

fn is_valid_boundary(boundary: &str) -> bool {
    if boundary.is_empty() || boundary.len() > MAX_BOUNDARY_LEN || boundary.ends_with(' ') {
        return false;
    }

    boundary.chars().all(|c| {
        c.is_ascii_alphanumeric()
            || matches!(
                c,
                '\'' | '(' | ')' | '+' | '_' | ',' | '-' | '.' | '/' | ':' | '=' | '?' | ' '
            )
    })
}
