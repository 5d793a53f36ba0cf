//! Identifier sanitization and case conventions.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{CodegenError, CodegenResult};
use crate::format::IacFormat;

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

const TYPESCRIPT_RESERVED: &[&str] = &[
    "arguments", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "enum", "eval", "export", "extends", "false", "finally",
    "for", "function",
    "if", "implements", "import", "in", "instanceof", "interface", "let", "new", "null",
    "package", "private", "protected", "public", "return", "static", "super", "switch", "this",
    "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

/// Split a name into ASCII alphanumeric words at separators and camel-case
/// boundaries.
pub fn split_words(input: &str) -> Vec<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_ascii_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_ascii_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).map_or(false, |n| n.is_ascii_lowercase());
            if prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_is_lower)
            {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase(),
        None => String::new(),
    }
}

pub fn to_snake_case(input: &str) -> String {
    split_words(input)
        .iter()
        .map(|w| w.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

pub fn to_camel_case(input: &str) -> String {
    split_words(input)
        .iter()
        .enumerate()
        .map(|(i, w)| if i == 0 { w.to_ascii_lowercase() } else { capitalize(w) })
        .collect()
}

pub fn to_pascal_case(input: &str) -> String {
    split_words(input).iter().map(|w| capitalize(w)).collect()
}

/// Property key in the format's naming convention.
pub fn convert_key(format: IacFormat, key: &str) -> String {
    let converted = match format {
        IacFormat::Terraform | IacFormat::PulumiPython => to_snake_case(key),
        IacFormat::CloudFormation => to_pascal_case(key),
        IacFormat::PulumiTypescript => to_camel_case(key),
    };
    if converted.is_empty() {
        key.to_string()
    } else {
        converted
    }
}

/// Whether `s` is a plain `[A-Za-z_][A-Za-z0-9_]*` identifier.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Sanitized identifier for a resource name in the given format.
///
/// Does not guarantee uniqueness; see [`NameTable`].
pub fn resource_identifier(format: IacFormat, name: &str) -> String {
    let base = match format {
        IacFormat::Terraform | IacFormat::PulumiPython => to_snake_case(name),
        IacFormat::CloudFormation => to_pascal_case(name),
        IacFormat::PulumiTypescript => to_camel_case(name),
    };
    let base = if base.is_empty() {
        "resource".to_string()
    } else {
        base
    };

    let leading_digit = base.starts_with(|c: char| c.is_ascii_digit());
    let mut ident = match (format, leading_digit) {
        (IacFormat::Terraform | IacFormat::PulumiPython, true) => format!("r_{base}"),
        (IacFormat::CloudFormation, true) => format!("R{base}"),
        (IacFormat::PulumiTypescript, true) => format!("r{base}"),
        (_, false) => base,
    };

    if is_reserved_word(format, &ident) {
        ident.push('_');
    }
    ident
}

/// Keyword argument name for Python call sites.
pub fn python_keyword_argument(key: &str) -> String {
    let mut arg = if is_identifier(key) {
        key.to_string()
    } else {
        resource_identifier(IacFormat::PulumiPython, key)
    };
    if PYTHON_KEYWORDS.contains(&arg.as_str()) {
        arg.push('_');
    }
    arg
}

/// Name a top-level property takes in rendered code: an HCL attribute, a
/// Python keyword argument, or the key itself.
pub fn attribute_key(format: IacFormat, key: &str) -> String {
    match format {
        IacFormat::Terraform if !is_identifier(key) => resource_identifier(format, key),
        IacFormat::PulumiPython => python_keyword_argument(key),
        _ => key.to_string(),
    }
}

fn is_reserved_word(format: IacFormat, ident: &str) -> bool {
    match format {
        IacFormat::PulumiPython => PYTHON_KEYWORDS.contains(&ident),
        IacFormat::PulumiTypescript => TYPESCRIPT_RESERVED.contains(&ident),
        IacFormat::Terraform | IacFormat::CloudFormation => false,
    }
}

/// Unique, sanitized identifiers for every resource in one artifact.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    idents: HashMap<String, String>,
}

impl NameTable {
    /// Assign identifiers in the given order. Collisions with earlier names or
    /// with `reserved` get a numeric suffix.
    pub fn new<'a>(
        format: IacFormat,
        names: impl IntoIterator<Item = &'a str>,
        reserved: &[&str],
    ) -> Self {
        let mut taken: HashSet<String> = reserved.iter().map(|r| r.to_string()).collect();
        let mut idents = HashMap::new();
        let separator = match format {
            IacFormat::Terraform | IacFormat::PulumiPython => "_",
            IacFormat::CloudFormation | IacFormat::PulumiTypescript => "",
        };

        for name in names {
            let base = resource_identifier(format, name);
            let mut candidate = base.clone();
            let mut n = 2;
            while taken.contains(&candidate) {
                candidate = format!("{base}{separator}{n}");
                n += 1;
            }
            taken.insert(candidate.clone());
            idents.insert(name.to_string(), candidate);
        }

        Self { idents }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.idents.get(name).map(String::as_str)
    }
}

static TERRAFORM_TARGET: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").ok());
static CLOUDFORMATION_TARGET: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]+(::[A-Za-z0-9]+){2}$").ok());
static PULUMI_TARGET: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)+$").ok()
});

/// Check a mapping target identifier before it is written into code.
pub fn validate_target(format: IacFormat, target: &str) -> CodegenResult<()> {
    let pattern = match format {
        IacFormat::Terraform => &*TERRAFORM_TARGET,
        IacFormat::CloudFormation => &*CLOUDFORMATION_TARGET,
        IacFormat::PulumiPython | IacFormat::PulumiTypescript => &*PULUMI_TARGET,
    };
    let re = pattern
        .as_ref()
        .ok_or_else(|| CodegenError::emission(format, "target pattern failed to compile"))?;
    if re.is_match(target) {
        Ok(())
    } else {
        Err(CodegenError::emission(
            format,
            format!("invalid target identifier '{target}'"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_words() {
        assert_eq!(split_words("web-sg"), vec!["web", "sg"]);
        assert_eq!(split_words("instanceType"), vec!["instance", "Type"]);
        assert_eq!(split_words("HTTPServer v2"), vec!["HTTP", "Server", "v2"]);
        assert_eq!(split_words("--"), Vec::<String>::new());
    }

    #[test]
    fn test_case_conversions() {
        assert_eq!(to_snake_case("vpcSecurityGroupIds"), "vpc_security_group_ids");
        assert_eq!(to_camel_case("vpc_security_group_ids"), "vpcSecurityGroupIds");
        assert_eq!(to_pascal_case("web-instance"), "WebInstance");
        assert_eq!(convert_key(IacFormat::CloudFormation, "cidr_block"), "CidrBlock");
        assert_eq!(convert_key(IacFormat::Terraform, "???"), "???");
    }

    #[test]
    fn test_resource_identifiers() {
        assert_eq!(resource_identifier(IacFormat::Terraform, "web-sg"), "web_sg");
        assert_eq!(resource_identifier(IacFormat::Terraform, "3tier"), "r_3tier");
        assert_eq!(resource_identifier(IacFormat::CloudFormation, "3tier"), "R3tier");
        assert_eq!(resource_identifier(IacFormat::PulumiTypescript, "web-sg"), "webSg");
        assert_eq!(resource_identifier(IacFormat::PulumiPython, "class"), "class_");
        assert_eq!(resource_identifier(IacFormat::PulumiTypescript, "new"), "new_");
        assert_eq!(resource_identifier(IacFormat::PulumiTypescript, "eval"), "eval_");
        assert_eq!(resource_identifier(IacFormat::PulumiTypescript, "arguments"), "arguments_");
        assert_eq!(resource_identifier(IacFormat::Terraform, "***"), "resource");
    }

    #[test]
    fn test_python_keyword_arguments() {
        assert_eq!(python_keyword_argument("lambda"), "lambda_");
        assert_eq!(python_keyword_argument("instance_type"), "instance_type");
        assert_eq!(python_keyword_argument("0day"), "r_0day");
    }

    #[test]
    fn test_attribute_keys() {
        assert_eq!(attribute_key(IacFormat::Terraform, "0day"), "r_0day");
        assert_eq!(attribute_key(IacFormat::Terraform, "instance_type"), "instance_type");
        assert_eq!(attribute_key(IacFormat::PulumiPython, "from"), "from_");
        assert_eq!(attribute_key(IacFormat::PulumiTypescript, "cost-center"), "cost-center");
    }

    #[test]
    fn test_name_table_deduplicates() {
        let table = NameTable::new(IacFormat::Terraform, ["web-sg", "web_sg", "aws"], &["aws"]);
        assert_eq!(table.get("web-sg"), Some("web_sg"));
        assert_eq!(table.get("web_sg"), Some("web_sg_2"));
        assert_eq!(table.get("aws"), Some("aws_2"));

        let table = NameTable::new(IacFormat::PulumiTypescript, ["a-b", "aB"], &[]);
        assert_eq!(table.get("aB"), Some("aB2"));
    }

    #[test]
    fn test_validate_target() {
        assert!(validate_target(IacFormat::Terraform, "aws_instance").is_ok());
        assert!(validate_target(IacFormat::Terraform, "aws-instance").is_err());
        assert!(validate_target(IacFormat::CloudFormation, "AWS::EC2::Instance").is_ok());
        assert!(validate_target(IacFormat::PulumiPython, "aws.lambda_.Function").is_ok());
        assert!(validate_target(IacFormat::PulumiTypescript, "Function").is_err());
    }
}
