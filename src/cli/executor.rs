//! Command executor for dispatching CLI commands

use std::io::Write;

use anyhow::Context;

use super::parser::{Cli, Commands};
use crate::config::settings::Settings;
use crate::store::StoreManager;

/// Execute the parsed command against the configured store.
///
/// `check` only reports the validated configuration and never connects.
pub async fn execute_command<W: Write>(
    cli: &Cli,
    settings: Settings,
    out: &mut W,
) -> anyhow::Result<()> {
    if cli.command == Commands::Check {
        writeln!(
            out,
            "configuration OK (backend: {})",
            settings.store.backend.as_str()
        )?;
        return Ok(());
    }

    let store = StoreManager::new(&settings.store)
        .await
        .with_context(|| format!("failed to open {} store", settings.store.backend.as_str()))?;

    run_command(&store, &cli.command, out).await
}

/// Run one command and print its result to `out`.
pub async fn run_command<W: Write>(
    store: &StoreManager,
    command: &Commands,
    out: &mut W,
) -> anyhow::Result<()> {
    tracing::debug!(?command, "running command");

    match command {
        Commands::Get { key } => {
            let raw = store.get(key).await?;
            writeln!(out, "{}", String::from_utf8_lossy(&raw))?;
        }
        Commands::Set { key, value } => {
            writeln!(out, "{}", store.set(key, value.clone().into_bytes()).await?)?;
        }
        Commands::Delete { key } => {
            writeln!(out, "{}", store.delete(key).await?)?;
        }
        Commands::Expire { key, seconds } => {
            writeln!(out, "{}", store.expire(key, *seconds).await?)?;
        }
        Commands::Ttl { key } => {
            writeln!(out, "{}", store.get_ttl(key).await?)?;
        }
        Commands::Persist { key } => {
            writeln!(out, "{}", store.persist(key).await?)?;
        }
        Commands::Has { key } => {
            writeln!(out, "{}", store.has(key).await?)?;
        }
        Commands::Flush => {
            writeln!(out, "{}", store.flush().await?)?;
        }
        Commands::Check => {
            writeln!(out, "configuration OK")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ManualClock, MemoryStore, StoreError};
    use clap::Parser;
    use std::sync::Arc;

    fn memory_store() -> (StoreManager, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_700_000_000));
        let backend = Arc::new(MemoryStore::new(clock.clone()));
        (StoreManager::with_backend(backend, clock.clone()), clock)
    }

    async fn run(store: &StoreManager, args: &[&str]) -> anyhow::Result<String> {
        let mut argv = vec!["kv-ttl"];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv)?;
        let mut out = Vec::new();
        run_command(store, &cli.command, &mut out).await?;
        Ok(String::from_utf8(out)?)
    }

    #[tokio::test]
    async fn test_ttl_session() {
        let (store, clock) = memory_store();

        assert_eq!(run(&store, &["set", "a", "hello"]).await.unwrap(), "true\n");
        assert_eq!(run(&store, &["has", "a"]).await.unwrap(), "true\n");
        assert_eq!(run(&store, &["expire", "a", "30"]).await.unwrap(), "true\n");
        clock.advance(1);
        assert_eq!(run(&store, &["ttl", "a"]).await.unwrap(), "29\n");
        assert_eq!(run(&store, &["persist", "a"]).await.unwrap(), "true\n");
        assert_eq!(run(&store, &["get", "a"]).await.unwrap(), "hello\n");
        assert_eq!(run(&store, &["delete", "a"]).await.unwrap(), "true\n");
        assert_eq!(run(&store, &["has", "a"]).await.unwrap(), "false\n");
    }

    #[tokio::test]
    async fn test_expire_missing_prints_false() {
        let (store, _) = memory_store();
        assert_eq!(
            run(&store, &["expire", "missing", "30"]).await.unwrap(),
            "false\n"
        );
    }

    #[tokio::test]
    async fn test_ttl_on_bare_value_errors() {
        let (store, _) = memory_store();
        run(&store, &["set", "a", "v"]).await.unwrap();
        let err = run(&store, &["ttl", "a"]).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::NoTtlAssociated(_))
        ));
    }

    #[tokio::test]
    async fn test_flush() {
        let (store, _) = memory_store();
        run(&store, &["set", "a", "1"]).await.unwrap();
        run(&store, &["set", "b", "2"]).await.unwrap();
        assert_eq!(run(&store, &["flush"]).await.unwrap(), "true\n");
        assert_eq!(run(&store, &["has", "b"]).await.unwrap(), "false\n");
    }

    #[tokio::test]
    async fn test_check_does_not_connect() {
        let mut settings = Settings::default();
        settings.store.backend = crate::config::settings::StoreBackend::Memcache;
        let cli = Cli::try_parse_from(["kv-ttl", "check"]).unwrap();
        let mut out = Vec::new();
        execute_command(&cli, settings, &mut out).await.unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "configuration OK (backend: memcache)\n"
        );
    }

    #[tokio::test]
    async fn test_execute_with_memory_backend() {
        let cli = Cli::try_parse_from(["kv-ttl", "has", "nothing"]).unwrap();
        let mut out = Vec::new();
        execute_command(&cli, Settings::default(), &mut out)
            .await
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "false\n");
    }
}
