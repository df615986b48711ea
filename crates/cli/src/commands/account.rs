//! `account` command handlers.

use std::io::{self, Write};
use std::path::PathBuf;

use cloudacct_account::{
    ConfigStore, CredentialImporter, CredentialKind, HttpServiceManagement, ImportOptions,
    ImportReport, RegistrationOutcome, RegistrationStatus, ResourceTypeRegistry,
    Subscription, SubscriptionResolver,
};
use eyre::Result;

use crate::cli::AccountCommands;

pub async fn handle_account_command(
    cmd: AccountCommands,
    store: &ConfigStore,
    registry: &ResourceTypeRegistry,
) -> Result<()> {
    match cmd {
        AccountCommands::Import {
            file,
            skip_register,
        } => handle_import(file, skip_register, store, registry).await,
        AccountCommands::Set { subscription } => handle_set(subscription, store).await,
        AccountCommands::List => handle_list(store).await,
        AccountCommands::Show => handle_show(store).await,
        AccountCommands::Clear { force } => handle_clear(force, store).await,
    }
}

async fn handle_import(
    file: PathBuf,
    skip_register: bool,
    store: &ConfigStore,
    registry: &ResourceTypeRegistry,
) -> Result<()> {
    let transport = HttpServiceManagement::new(store.clone());
    let importer = CredentialImporter::new(store, registry, &transport);

    let report = importer
        .import_file(&file, ImportOptions { skip_register })
        .await?;

    println!("✅ Imported {} from {}", report.kind, file.display());
    print_import_report(&report);
    Ok(())
}

fn print_import_report(report: &ImportReport) {
    if report.kind == CredentialKind::PublishSettings && report.subscriptions.is_empty() {
        println!("⚠️  The file contains no subscriptions; no current subscription was set");
        return;
    }

    for subscription in &report.subscriptions {
        println!("  {} ({})", subscription.name, subscription.id);
    }
    if let Some(current) = &report.current_subscription {
        println!("Current subscription: {} ({})", current.name, current.id);
    }

    match &report.registration {
        RegistrationStatus::Skipped => {}
        RegistrationStatus::Completed(registration) => {
            for (name, outcome) in &registration.outcomes {
                match outcome {
                    RegistrationOutcome::Registered => println!("  📦 Registered {}", name),
                    RegistrationOutcome::Failed(message) => {
                        println!("  ❌ Failed to register {}: {}", name, message)
                    }
                    RegistrationOutcome::AlreadyRegistered | RegistrationOutcome::UnknownType => {}
                }
            }
            if let Some(summary) = registration.failure_summary() {
                eprintln!("⚠️  Some resource providers could not be registered: {}", summary);
            }
        }
        RegistrationStatus::Aborted(message) => {
            eprintln!("⚠️  Resource provider registration did not run: {}", message);
        }
    }
}

async fn handle_set(token: String, store: &ConfigStore) -> Result<()> {
    let resolver = SubscriptionResolver::new(store);
    let id = resolver
        .resolve(Some(token.as_str()))
        .await?
        .unwrap_or_else(|| token.clone());

    let subscription = resolver.set_current(&id).await?;
    println!(
        "✅ Current subscription set to {} ({})",
        subscription.name, subscription.id
    );
    Ok(())
}

async fn handle_list(store: &ConfigStore) -> Result<()> {
    let subscriptions = SubscriptionResolver::new(store).subscriptions().await?;
    let current = store.read_config().await?.subscription;
    for line in subscription_lines(&subscriptions, current.as_deref()) {
        println!("{}", line);
    }
    Ok(())
}

fn subscription_lines(subscriptions: &[Subscription], current: Option<&str>) -> Vec<String> {
    if subscriptions.is_empty() {
        return vec![
            "No subscriptions imported".to_string(),
            "💡 Use 'cloudacct account import <file>' to import a publish settings file"
                .to_string(),
        ];
    }

    let mut lines = vec![format!("Subscriptions ({}):", subscriptions.len())];
    for subscription in subscriptions {
        let marker = if current == Some(subscription.id.as_str()) {
            "*"
        } else {
            " "
        };
        lines.push(format!("{} {}  {}", marker, subscription.name, subscription.id));
    }
    lines
}

async fn handle_show(store: &ConfigStore) -> Result<()> {
    for line in account_summary(store).await? {
        println!("{}", line);
    }
    Ok(())
}

async fn account_summary(store: &ConfigStore) -> Result<Vec<String>> {
    let config = store.read_config().await?;
    let has_credential = store.read_credential_material().await?.is_some();

    let mut lines = vec![
        format!("Configuration: {}", store.root().display()),
        format!("Endpoint: {}", config.effective_endpoint()),
    ];
    match config.subscription {
        Some(id) => {
            let subscriptions = SubscriptionResolver::new(store).subscriptions().await?;
            match subscriptions.iter().find(|s| s.id == id) {
                Some(subscription) => {
                    lines.push(format!("Subscription: {} ({})", subscription.name, id))
                }
                None => lines.push(format!("Subscription: {}", id)),
            }
        }
        None => lines.push("Subscription: (none configured)".to_string()),
    }
    lines.push(format!(
        "Management certificate: {}",
        if has_credential { "present" } else { "(not imported)" }
    ));
    Ok(lines)
}

async fn handle_clear(force: bool, store: &ConfigStore) -> Result<()> {
    if !force {
        print!("Are you sure you want to remove all account information? (y/N): ");
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if !input.trim().to_lowercase().starts_with('y') {
            println!("❌ Cancelled");
            return Ok(());
        }
    }

    if store.clear().await {
        println!("✅ Account information removed");
    } else {
        println!("Nothing to clear");
    }
    Ok(())
}
