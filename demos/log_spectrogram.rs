//! Log-power spectrogram of a synthetic chord, with debug logging enabled.
//! Run with `RUST_LOG=trace cargo run --example log_spectrogram`.

use stftpack::{FramingPolicy, SpectrogramEngine, StftConfig, StftError};

const SAMPLE_RATE: f32 = 16_000.0;

fn main() -> Result<(), StftError> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .parse_default_env()
        .init();

    let seconds = 2;
    let n = SAMPLE_RATE as usize * seconds;
    let signal: Vec<f32> = (0..n)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            [440.0f32, 554.4, 659.3]
                .iter()
                .map(|f| (2.0 * std::f32::consts::PI * f * t).sin() / 3.0)
                .sum()
        })
        .collect();

    let config = StftConfig::new(n, 1024, 512, 1e-10).with_framing(FramingPolicy::Covering);
    let mut engine = SpectrogramEngine::new(config)?;
    let log_power = engine.forward_log_spectrogram(&signal)?;
    println!("{} frames x {} bins", log_power.rows(), log_power.cols());

    if let Some(row) = log_power.row(log_power.rows() / 2) {
        let (bin, peak) = row
            .iter()
            .copied()
            .enumerate()
            .fold((0, f32::MIN), |best, (j, v)| if v > best.1 { (j, v) } else { best });
        println!("loudest bin in middle frame: {} (log power {:.2})", bin, peak);
    }
    Ok(())
}
