use clap::Parser;
use paxlst_codec::config::cli::{CliConfig, Mode};
use paxlst_codec::config::file::ProfileConfig;
use paxlst_codec::utils::{logger, validation::Validate};
use paxlst_codec::{decode, encode, CodecConfig, Reservation};

fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting paxlst-codec CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 載入並驗證編解碼設定
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.mode {
        Mode::Decode => run_decode(&cli, &config),
        Mode::Encode => run_encode(&cli, &config),
    };

    if let Err(e) = result {
        tracing::error!("❌ Codec operation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn load_config(cli: &CliConfig) -> paxlst_codec::Result<CodecConfig> {
    let config = match &cli.profile {
        Some(path) => {
            tracing::debug!("Loading codec profile from {}", path);
            ProfileConfig::from_file(path)?.into_codec_config()?
        }
        None => CodecConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn run_decode(cli: &CliConfig, config: &CodecConfig) -> paxlst_codec::Result<()> {
    let input = std::fs::read_to_string(&cli.input)?;
    let outcome = decode(&input, config)?;

    tracing::info!(
        "Decoded {} passengers ({} violations)",
        outcome.manifest.passengers.len(),
        outcome.violations.len()
    );

    if cli.json {
        let rendered = serde_json::to_string_pretty(&outcome.manifest)?;
        write_output(cli, &rendered)?;
    } else {
        let mut lines = Vec::new();
        lines.push(format!(
            "Manifest {} ({} passengers)",
            outcome.manifest.message_reference.as_deref().unwrap_or("-"),
            outcome.manifest.passengers.len()
        ));
        for passenger in &outcome.manifest.passengers {
            let documents: Vec<&str> = passenger
                .documents
                .iter()
                .map(|d| d.number.as_str())
                .collect();
            lines.push(format!(
                "  {:<30} seat {:<5} documents [{}]",
                passenger.full_name(),
                passenger.seat.as_deref().unwrap_or("-"),
                documents.join(", ")
            ));
        }
        write_output(cli, &lines.join("\n"))?;
    }

    if outcome.violations.is_empty() {
        println!("✅ Manifest decoded with no violations");
    } else {
        println!("⚠️ Manifest decoded with {} violations:", outcome.violations.len());
        for violation in &outcome.violations {
            println!("  ⚠️ {}", violation);
        }
    }

    Ok(())
}

fn run_encode(cli: &CliConfig, config: &CodecConfig) -> paxlst_codec::Result<()> {
    let raw = std::fs::read_to_string(&cli.input)?;
    let reservation: Reservation = serde_json::from_str(&raw)?;

    let outcome = encode(&reservation, config)?;
    tracing::info!(
        "Encoded {} passengers, {} flights, {} segments",
        outcome.passenger_count,
        outcome.flight_count,
        outcome.segment_count
    );

    write_output(cli, &outcome.edifact)?;
    println!(
        "✅ Encoded {} passengers across {} flights ({} segments)",
        outcome.passenger_count, outcome.flight_count, outcome.segment_count
    );

    Ok(())
}

fn write_output(cli: &CliConfig, content: &str) -> paxlst_codec::Result<()> {
    match &cli.output {
        Some(path) => {
            std::fs::write(path, content)?;
            println!("📁 Output saved to: {}", path);
        }
        None => println!("{}", content),
    }
    Ok(())
}
