//! The file handed to the converter, held in memory until submission.

/// A pending upload: original filename plus raw bytes.
#[derive(Debug, Clone)]
pub struct Upload {
    /// The file's original name. Also the suggested name for the
    /// converted artifact, regardless of server-side naming.
    pub filename: String,
    pub data: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            data,
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Suggested filename for the downloaded artifact: always the
    /// original upload's name, never the server's.
    pub fn suggested_filename(&self) -> &str {
        &self.filename
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggested_filename_equals_upload_name() {
        let upload = Upload::new("holiday.mp4", vec![0u8; 16]);
        assert_eq!(upload.suggested_filename(), "holiday.mp4");
    }

    #[test]
    fn size_reports_byte_length() {
        let upload = Upload::new("a.png", vec![0u8; 2048]);
        assert_eq!(upload.size(), 2048);
    }
}
