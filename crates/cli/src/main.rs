//! CLI tool turning a research topic into a PowerPoint deck.

use anyhow::{Context, Result};
use clap::Parser;
use deck_core::{Config, ResearchCollector, Translator};
use deck_pptx::DeckBuilder;
use deck_services::{ChatResearcher, ChatTranslator, ImageModelGenerator, OpenAiClient};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Research a topic, translate the report and build a slide deck from it.
#[derive(Parser, Debug)]
#[command(name = "research-deck")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Research topic (prompted for when omitted)
    topic: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    if let Err(e) = dotenvy::dotenv() {
        log::debug!("No .env file loaded: {}", e);
    }

    let result = execute(args).await;
    if let Err(e) = &result {
        log::error!("An error occurred: {:#}", e);
    }
    result
}

async fn execute(args: Args) -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    let topic = match args.topic {
        Some(topic) => topic,
        None => prompt_topic().await?,
    };
    let topic = topic.trim();
    if topic.is_empty() {
        anyhow::bail!("Research topic is empty");
    }

    let client = OpenAiClient::new(&config)?;
    let researcher = ChatResearcher::new(client.clone(), &config);
    let translator = ChatTranslator::new(client.clone(), &config);
    let images = Arc::new(ImageModelGenerator::new(client, &config));
    let builder = DeckBuilder::new(images, &config);

    let path = run(topic, &config, &researcher, &translator, &builder).await?;
    println!("Presentation created: {}", path.display());

    Ok(())
}

/// Ask for the topic on stdin.
async fn prompt_topic() -> Result<String> {
    print!("Enter a research topic: ");
    std::io::stdout().flush().context("Failed to write prompt")?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("Failed to read topic from stdin")?;

    Ok(line)
}

/// Research, translate and build in sequence.
async fn run(
    topic: &str,
    config: &Config,
    researcher: &dyn ResearchCollector,
    translator: &dyn Translator,
    builder: &DeckBuilder,
) -> Result<PathBuf> {
    log::info!("Starting research on '{}'...", topic);
    let report = researcher
        .research(topic, &config.report_type)
        .await
        .context("Research failed")?;
    log::debug!("Research report has {} characters", report.chars().count());

    log::info!("Translating into {}...", config.target_language);
    let translated = translator
        .translate(&report)
        .await
        .context("Translation failed")?;

    log::info!("Building presentation...");
    let path = builder
        .create_presentation(&translated, &config.output_dir)
        .await
        .context("Failed to build presentation")?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use deck_core::{Error, ImageGenerator};
    use deck_pptx::DeckReader;
    use std::sync::Mutex;

    struct CannedResearcher {
        seen: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl ResearchCollector for CannedResearcher {
        async fn research(&self, topic: &str, report_type: &str) -> deck_core::Result<String> {
            self.seen
                .lock()
                .unwrap()
                .push((topic.to_string(), report_type.to_string()));
            Ok("# Quantum\nOverview\n---\n## Hardware\n- qubits\n".to_string())
        }
    }

    /// Marks every heading so the test can tell translated text apart.
    struct MarkingTranslator;

    #[async_trait]
    impl Translator for MarkingTranslator {
        async fn translate(&self, markdown: &str) -> deck_core::Result<String> {
            Ok(markdown.replace("Quantum", "量子").replace("Hardware", "ハードウェア"))
        }
    }

    struct FailingTranslator;

    #[async_trait]
    impl Translator for FailingTranslator {
        async fn translate(&self, _markdown: &str) -> deck_core::Result<String> {
            Err(Error::Collaborator("Translation result was empty".to_string()))
        }
    }

    struct NoImages;

    #[async_trait]
    impl ImageGenerator for NoImages {
        async fn generate_image(&self, _prompt: &str) -> deck_core::Result<Option<String>> {
            Ok(None)
        }

        async fn download(&self, _url: &str) -> deck_core::Result<Vec<u8>> {
            unreachable!()
        }
    }

    fn config(dir: &std::path::Path) -> Config {
        let mut config = Config::new("sk-test");
        config.output_dir = dir.join("output");
        config
    }

    #[tokio::test]
    async fn test_run_builds_translated_deck() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let researcher = CannedResearcher {
            seen: Mutex::new(Vec::new()),
        };
        let builder = DeckBuilder::new(Arc::new(NoImages), &config);

        let path = run("quantum computing", &config, &researcher, &MarkingTranslator, &builder)
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("output").join("presentation.pptx"));
        assert_eq!(
            researcher.seen.lock().unwrap().as_slice(),
            &[("quantum computing".to_string(), "research_report".to_string())]
        );

        let summary = DeckReader::new().open(&path).unwrap();
        assert_eq!(summary.slides.len(), 3);
        assert_eq!(summary.slides[0].texts(), vec!["量子"]);
        assert_eq!(summary.slides[1].texts(), vec!["はじめに", "Overview"]);
        assert_eq!(summary.slides[2].texts(), vec!["ハードウェア", "• qubits"]);
    }

    #[tokio::test]
    async fn test_run_stops_on_translation_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let researcher = CannedResearcher {
            seen: Mutex::new(Vec::new()),
        };
        let builder = DeckBuilder::new(Arc::new(NoImages), &config);

        let err = run("quantum", &config, &researcher, &FailingTranslator, &builder)
            .await
            .unwrap_err();

        assert!(format!("{:#}", err).contains("Translation result was empty"));
        assert!(!config.output_dir.join("presentation.pptx").exists());
    }

    #[test]
    fn test_args_accept_optional_topic() {
        let args = Args::parse_from(["research-deck", "-v", "quantum computing"]);
        assert_eq!(args.topic.as_deref(), Some("quantum computing"));
        assert!(args.verbose);

        let args = Args::parse_from(["research-deck"]);
        assert!(args.topic.is_none());
    }
}
