use crate::provider::ProviderError;
use rates_common::{DataError, ErrorKind};
use thiserror::Error;

/// Service layer error types
///
/// Every variant keeps the kind of the error it wraps; see [`ServiceError::kind`].
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("invalid param: {0}")]
    InvalidParameter(String),

    #[error("{context}: {source}")]
    Provider {
        context: &'static str,
        #[source]
        source: ProviderError,
    },

    #[error("{context}: {source}")]
    Data {
        context: &'static str,
        #[source]
        source: DataError,
    },

    #[error("failed to check existing titles: {0}")]
    Backfill(#[source] Box<ServiceError>),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::InvalidParameter(_) => ErrorKind::InvalidParameter,
            ServiceError::Provider { source, .. } => source.kind(),
            ServiceError::Data { source, .. } => source.kind(),
            ServiceError::Backfill(inner) => inner.kind(),
        }
    }

    pub(crate) fn provider(context: &'static str) -> impl FnOnce(ProviderError) -> Self {
        move |source| ServiceError::Provider { context, source }
    }

    pub(crate) fn data(context: &'static str) -> impl FnOnce(DataError) -> Self {
        move |source| ServiceError::Data { context, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapping_preserves_kind() {
        let not_found = ServiceError::provider("failed to get actual rates for missing titles")(
            ProviderError::NotFound("empty response from API".into()),
        );
        let wrapped = ServiceError::Backfill(Box::new(not_found));

        assert_eq!(wrapped.kind(), ErrorKind::NotFound);
        assert_eq!(
            wrapped.to_string(),
            "failed to check existing titles: failed to get actual rates for missing titles: \
             missing data: empty response from API"
        );

        let storage = ServiceError::data("failed to get coins list from storage")(
            DataError::Decode("bad row".into()),
        );
        assert_eq!(storage.kind(), ErrorKind::Internal);
        assert_eq!(
            ServiceError::InvalidParameter("titles list is empty".into()).kind(),
            ErrorKind::InvalidParameter
        );
    }
}
