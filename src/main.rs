use lipschitz_sampler::{LipschitzSampler, SamplerConfig, SamplerError};
use rand::{self, Rng};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), SamplerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let rng = rand::thread_rng();

    let config = SamplerConfig::default();
    let sampler = LipschitzSampler::new(|x: f64| -x * x + x, 1.0, 0.0..=1.0, &config)?;

    for s in rng.sample_iter(&sampler).take(100) {
        println!("{s}")
    }
    Ok(())
}
