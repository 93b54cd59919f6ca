use thiserror::Error;

use super::models::DownloadRequest;

const MAX_LINK_BYTES: usize = 2048;

#[derive(Debug, Error)]
pub enum SubmissionValidationError {
    #[error("no links provided")]
    NoLinks,
    #[error("too many links: {count} (limit {limit})")]
    TooManyLinks { count: usize, limit: usize },
    #[error("link at position {0} is blank")]
    BlankLink(usize),
    #[error("link at position {0} exceeds 2048 bytes")]
    LinkTooLong(usize),
    #[error("link '{0}' must not start with '-'")]
    FlagLikeLink(String),
}

pub fn validate_submission(
    request: &DownloadRequest,
    max_links: usize,
) -> Result<(), SubmissionValidationError> {
    if request.links.is_empty() {
        return Err(SubmissionValidationError::NoLinks);
    }

    if request.links.len() > max_links {
        return Err(SubmissionValidationError::TooManyLinks {
            count: request.links.len(),
            limit: max_links,
        });
    }

    for (position, link) in request.links.iter().enumerate() {
        let trimmed = link.trim();
        if trimmed.is_empty() {
            return Err(SubmissionValidationError::BlankLink(position));
        }

        if link.len() > MAX_LINK_BYTES {
            return Err(SubmissionValidationError::LinkTooLong(position));
        }

        // The link is handed to the downloader as a positional argument
        if trimmed.starts_with('-') {
            return Err(SubmissionValidationError::FlagLikeLink(link.clone()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(links: &[&str]) -> DownloadRequest {
        DownloadRequest {
            links: links.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn validate_submission_accepts_links() {
        let request = request(&[
            "https://music.youtube.com/watch?v=abc",
            "https://music.youtube.com/playlist?list=xyz",
        ]);
        assert!(validate_submission(&request, 10).is_ok());
    }

    #[test]
    fn validate_submission_rejects_empty_list() {
        let err = validate_submission(&request(&[]), 10).unwrap_err();
        assert!(matches!(err, SubmissionValidationError::NoLinks));
        assert_eq!(err.to_string(), "no links provided");
    }

    #[test]
    fn validate_submission_limits_link_count() {
        let err = validate_submission(&request(&["a", "b", "c"]), 2).unwrap_err();
        assert!(matches!(
            err,
            SubmissionValidationError::TooManyLinks { count: 3, limit: 2 }
        ));
    }

    #[test]
    fn validate_submission_rejects_blank_link() {
        let err = validate_submission(&request(&["a", "   "]), 10).unwrap_err();
        assert!(matches!(err, SubmissionValidationError::BlankLink(1)));
    }

    #[test]
    fn validate_submission_rejects_oversized_link() {
        let long = "x".repeat(MAX_LINK_BYTES + 1);
        let err = validate_submission(&request(&[&long]), 10).unwrap_err();
        assert!(matches!(err, SubmissionValidationError::LinkTooLong(0)));
    }

    #[test]
    fn validate_submission_rejects_flag_like_link() {
        let err = validate_submission(&request(&["--output-path=/etc"]), 10).unwrap_err();
        assert!(matches!(err, SubmissionValidationError::FlagLikeLink(_)));
    }
}
