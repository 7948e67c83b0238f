fn main() {
    if let Err(e) = run() {
        eprintln!("throughput bench failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    use serde::Serialize;
    use std::path::{Path, PathBuf};
    use std::time::Instant;

    use vocet_core::resample::RateConverter;
    use vocet_core::{
        BitFrame, EncodeBlock, EnvelopeCodec, StreamBlock, CODEC_SAMPLE_RATE, FRAME_SAMPLES,
    };

    #[derive(Debug)]
    struct Args {
        wav: Option<PathBuf>,
        seconds: usize,
        output: Option<PathBuf>,
    }

    #[derive(Debug, Serialize)]
    struct Summary {
        source: String,
        input_samples: usize,
        input_seconds: f64,
        frames: usize,
        leftover_samples: usize,
        encode_ms: f64,
        realtime_factor: f64,
    }

    fn parse_args() -> Result<Args, String> {
        let mut wav: Option<PathBuf> = None;
        let mut seconds: usize = 60;
        let mut output: Option<PathBuf> = None;

        let mut it = std::env::args().skip(1);
        while let Some(arg) = it.next() {
            match arg.as_str() {
                "--wav" => {
                    let Some(v) = it.next() else {
                        return Err("missing value for --wav".into());
                    };
                    wav = Some(PathBuf::from(v));
                }
                "--seconds" => {
                    let Some(v) = it.next() else {
                        return Err("missing value for --seconds".into());
                    };
                    seconds = v
                        .parse::<usize>()
                        .map_err(|_| "invalid value for --seconds".to_string())?
                        .clamp(1, 3600);
                }
                "--output" => {
                    let Some(v) = it.next() else {
                        return Err("missing value for --output".into());
                    };
                    output = Some(PathBuf::from(v));
                }
                "--help" | "-h" => {
                    println!(
                        "Usage: cargo run -p vocet-core --bin throughput -- \\
  [--wav <file.wav>] [--seconds <n>] [--output <file.json>]"
                    );
                    std::process::exit(0);
                }
                other => {
                    return Err(format!("unknown argument: {other}"));
                }
            }
        }

        Ok(Args {
            wav,
            seconds,
            output,
        })
    }

    /// Read a WAV as mono i16 at the codec rate, downmixing and resampling
    /// as needed.
    fn read_wav_mono_8k(path: &Path) -> Result<Vec<i16>, String> {
        let mut reader = hound::WavReader::open(path).map_err(|e| e.to_string())?;
        let spec = reader.spec();
        let channels = usize::from(spec.channels.max(1));

        if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample > 16 {
            return Err(format!(
                "{}: only 16-bit integer WAVs are supported",
                path.display()
            ));
        }

        let interleaved: Vec<i16> = reader
            .samples::<i16>()
            .map(|s| s.map_err(|e| e.to_string()))
            .collect::<Result<Vec<_>, _>>()?;

        let mono: Vec<i16> = if channels == 1 {
            interleaved
        } else {
            interleaved
                .chunks(channels)
                .map(|frame| {
                    let sum: i32 = frame.iter().map(|&s| i32::from(s)).sum();
                    (sum / channels as i32) as i16
                })
                .collect()
        };

        if spec.sample_rate == CODEC_SAMPLE_RATE {
            return Ok(mono);
        }

        let mut converter = RateConverter::new(spec.sample_rate, CODEC_SAMPLE_RATE, 1024)
            .map_err(|e| e.to_string())?;
        Ok(converter.process(&mono))
    }

    /// Synthetic 400 Hz tone at the codec rate.
    fn synth_tone(seconds: usize) -> Vec<i16> {
        let total = seconds * CODEC_SAMPLE_RATE as usize;
        (0..total)
            .map(|i| {
                let t = i as f64 / f64::from(CODEC_SAMPLE_RATE);
                (12_000.0 * (2.0 * std::f64::consts::PI * 400.0 * t).sin()) as i16
            })
            .collect()
    }

    let args = parse_args()?;

    let (source, samples) = match &args.wav {
        Some(path) => (path.display().to_string(), read_wav_mono_8k(path)?),
        None => (
            format!("synthetic tone ({} s)", args.seconds),
            synth_tone(args.seconds),
        ),
    };

    if samples.len() < FRAME_SAMPLES {
        return Err(format!(
            "source too short: {} samples, need at least {FRAME_SAMPLES}",
            samples.len()
        ));
    }

    println!(
        "Encoding {} samples ({:.1} s at {CODEC_SAMPLE_RATE} Hz) from {source}",
        samples.len(),
        samples.len() as f64 / f64::from(CODEC_SAMPLE_RATE)
    );

    let mut block = EncodeBlock::new(Box::new(EnvelopeCodec::new()));
    let mut slots = vec![BitFrame::default(); 64];
    let mut offset = 0usize;
    let mut frames = 0usize;

    let started = Instant::now();
    loop {
        let progress = block
            .process(&samples[offset..], &mut slots)
            .map_err(|e| e.to_string())?;
        if progress.is_stalled() {
            break;
        }
        offset += progress.consumed;
        frames += progress.produced;
    }
    let encode_ms = started.elapsed().as_secs_f64() * 1000.0;

    let input_seconds = samples.len() as f64 / f64::from(CODEC_SAMPLE_RATE);
    let summary = Summary {
        source,
        input_samples: samples.len(),
        input_seconds,
        frames,
        leftover_samples: samples.len() - offset,
        encode_ms,
        realtime_factor: input_seconds / (encode_ms / 1000.0).max(f64::EPSILON),
    };

    println!(
        "Done. frames={} encode={:.2}ms realtime_factor={:.0}x",
        summary.frames, summary.encode_ms, summary.realtime_factor
    );

    let json = serde_json::to_string_pretty(&summary).map_err(|e| e.to_string())?;
    if let Some(out) = args.output {
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        std::fs::write(&out, json).map_err(|e| e.to_string())?;
        println!("Wrote bench report: {}", out.display());
    } else {
        println!("{json}");
    }

    Ok(())
}
