//! Output format definitions.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CodegenError;

/// Target Infrastructure-as-Code syntaxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IacFormat {
    #[serde(rename = "terraform")]
    Terraform,
    #[serde(rename = "cloudformation")]
    CloudFormation,
    #[serde(rename = "pulumi-python")]
    PulumiPython,
    #[serde(rename = "pulumi-typescript")]
    PulumiTypescript,
}

impl IacFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            IacFormat::Terraform => "terraform",
            IacFormat::CloudFormation => "cloudformation",
            IacFormat::PulumiPython => "pulumi-python",
            IacFormat::PulumiTypescript => "pulumi-typescript",
        }
    }

    pub fn all() -> Vec<Self> {
        vec![
            IacFormat::Terraform,
            IacFormat::CloudFormation,
            IacFormat::PulumiPython,
            IacFormat::PulumiTypescript,
        ]
    }

    /// Name of the single file generated for this format.
    pub fn filename(&self) -> &'static str {
        match self {
            IacFormat::Terraform => "main.tf",
            IacFormat::CloudFormation => "template.json",
            IacFormat::PulumiPython => "__main__.py",
            IacFormat::PulumiTypescript => "index.ts",
        }
    }

    /// Human-readable label.
    pub fn display_name(&self) -> &'static str {
        match self {
            IacFormat::Terraform => "Terraform",
            IacFormat::CloudFormation => "CloudFormation",
            IacFormat::PulumiPython => "Pulumi (Python)",
            IacFormat::PulumiTypescript => "Pulumi (TypeScript)",
        }
    }

    /// Syntax of the generated code, for highlighting.
    pub fn language(&self) -> &'static str {
        match self {
            IacFormat::Terraform => "hcl",
            IacFormat::CloudFormation => "json",
            IacFormat::PulumiPython => "python",
            IacFormat::PulumiTypescript => "typescript",
        }
    }
}

impl FromStr for IacFormat {
    type Err = CodegenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "terraform" | "hcl" | "tf" => Ok(IacFormat::Terraform),
            "cloudformation" | "cfn" => Ok(IacFormat::CloudFormation),
            "pulumi-python" | "python" => Ok(IacFormat::PulumiPython),
            "pulumi-typescript" | "typescript" | "ts" => Ok(IacFormat::PulumiTypescript),
            _ => Err(CodegenError::UnknownFormat(s.to_string())),
        }
    }
}

impl std::fmt::Display for IacFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("TF".parse::<IacFormat>().unwrap(), IacFormat::Terraform);
        assert_eq!("pulumi-python".parse::<IacFormat>().unwrap(), IacFormat::PulumiPython);
        assert!("bicep".parse::<IacFormat>().is_err());
    }

    #[test]
    fn test_serde_names_match_as_str() {
        for format in IacFormat::all() {
            let encoded = serde_json::to_string(&format).unwrap();
            assert_eq!(encoded, format!("\"{}\"", format.as_str()));
        }
    }
}
