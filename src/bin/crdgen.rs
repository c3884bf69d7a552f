//! Prints the BackplaneConfig CRD manifest to stdout.

use backplane_operator::crd::BackplaneConfig;
use kube::CustomResourceExt;

fn main() -> anyhow::Result<()> {
    print!("{}", serde_yaml::to_string(&BackplaneConfig::crd())?);
    Ok(())
}
