//! Invocation boundary checks.

use serde::{Deserialize, Serialize};
use tracing::debug;

use infra_graph::CloudProvider;

use crate::error::{CodegenError, CodegenResult};
use crate::format::IacFormat;

/// A conversion request as received from the request layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRequest {
    pub provider: CloudProvider,
    pub formats: Vec<IacFormat>,
}

impl ConversionRequest {
    pub fn new(provider: CloudProvider, formats: impl IntoIterator<Item = IacFormat>) -> Self {
        Self {
            provider,
            formats: formats.into_iter().collect(),
        }
    }

    /// Validate the request before any graph is built.
    ///
    /// Returns the formats de-duplicated in first-seen order. CloudFormation
    /// is only accepted for AWS.
    pub fn validate(&self) -> CodegenResult<Vec<IacFormat>> {
        let mut formats = Vec::with_capacity(self.formats.len());
        for &format in &self.formats {
            if !formats.contains(&format) {
                formats.push(format);
            }
        }

        if formats.is_empty() {
            return Err(CodegenError::NoFormatsRequested);
        }

        if let Some(&format) = formats
            .iter()
            .find(|f| !supports(**f, self.provider))
        {
            return Err(CodegenError::UnsupportedFormat {
                format,
                provider: self.provider,
            });
        }

        debug!(
            "Validated request for {}: {:?}",
            self.provider,
            formats.iter().map(IacFormat::as_str).collect::<Vec<_>>()
        );
        Ok(formats)
    }
}

/// Whether a format can target a provider.
pub fn supports(format: IacFormat, provider: CloudProvider) -> bool {
    match format {
        IacFormat::CloudFormation => provider == CloudProvider::Aws,
        IacFormat::Terraform | IacFormat::PulumiPython | IacFormat::PulumiTypescript => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedupes_in_order() {
        let request = ConversionRequest::new(
            CloudProvider::Aws,
            [
                IacFormat::PulumiTypescript,
                IacFormat::Terraform,
                IacFormat::PulumiTypescript,
            ],
        );
        assert_eq!(
            request.validate().unwrap(),
            vec![IacFormat::PulumiTypescript, IacFormat::Terraform]
        );
    }

    #[test]
    fn test_rejects_empty_and_unsupported() {
        let empty = ConversionRequest::new(CloudProvider::Aws, Vec::new());
        assert!(matches!(empty.validate(), Err(CodegenError::NoFormatsRequested)));

        let cfn = ConversionRequest::new(
            CloudProvider::Gcp,
            [IacFormat::Terraform, IacFormat::CloudFormation],
        );
        assert!(matches!(
            cfn.validate(),
            Err(CodegenError::UnsupportedFormat {
                format: IacFormat::CloudFormation,
                provider: CloudProvider::Gcp
            })
        ));
    }

    #[test]
    fn test_deserialize() {
        let request: ConversionRequest =
            serde_json::from_str(r#"{"provider": "azure", "formats": ["terraform", "pulumi-python"]}"#)
                .unwrap();
        assert_eq!(request.provider, CloudProvider::Azure);
        assert_eq!(request.validate().unwrap().len(), 2);
    }
}
