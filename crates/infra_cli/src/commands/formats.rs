//! Formats command - List supported output formats.

use anyhow::Result;
use clap::Args;

use infra_codegen::request::supports;
use infra_codegen::IacFormat;
use infra_graph::CloudProvider;

#[derive(Args)]
pub struct FormatsArgs {
    /// Only list formats available for this provider
    #[arg(short, long)]
    provider: Option<CloudProvider>,
}

pub async fn execute(args: FormatsArgs) -> Result<()> {
    let providers = match args.provider {
        Some(provider) => vec![provider],
        None => CloudProvider::all(),
    };

    println!("{:<20} {:<22} {:<15} PROVIDERS", "FORMAT", "NAME", "FILE");
    for format in available(&providers) {
        let names: Vec<&str> = providers
            .iter()
            .filter(|p| supports(format, **p))
            .map(CloudProvider::as_str)
            .collect();
        println!(
            "{:<20} {:<22} {:<15} {}",
            format.as_str(),
            format.display_name(),
            format.filename(),
            names.join(", ")
        );
    }

    Ok(())
}

/// Formats usable with at least one of `providers`.
fn available(providers: &[CloudProvider]) -> Vec<IacFormat> {
    IacFormat::all()
        .into_iter()
        .filter(|f| providers.iter().any(|p| supports(*f, *p)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cloudformation_only_listed_for_aws() {
        assert_eq!(available(&[CloudProvider::Gcp]).len(), 3);
        assert!(available(&[CloudProvider::Aws]).contains(&IacFormat::CloudFormation));
        assert_eq!(available(&CloudProvider::all()).len(), 4);
    }
}
