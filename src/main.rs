use cart_sync::utils::error::ErrorSeverity;
use cart_sync::utils::validation::{validate_required_field, Validate};
use cart_sync::utils::logger;
use cart_sync::{
    ActionButton, CartError, CartPage, CartSynchronizer, CliConfig, Command, ConsoleNotifier, LineKey, NotifyButton,
    ProductActions, ReqwestTransport, SnapshotFile, TomlConfig,
};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 載入配置，未指定時使用預設值
    let config = match &cli.config {
        Some(path) => match TomlConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("❌ Failed to load config file '{}': {}", path, e);
                eprintln!("💡 Make sure the file exists and is valid TOML format");
                std::process::exit(1);
            }
        },
        None => TomlConfig::default(),
    };

    // 初始化日誌
    if config.json_logs() {
        logger::init_json_logger(cli.verbose, config.log_level());
    } else {
        logger::init_cli_logger(cli.verbose, config.log_level());
    }

    tracing::info!("🚀 Starting cart-sync");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if let Err(e) = run(&cli, &config).await {
        tracing::error!(
            "❌ {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,      // 重試即可
            ErrorSeverity::Medium => 2,   // 伺服器或網路
            ErrorSeverity::High => 1,     // 輸入錯誤
            ErrorSeverity::Critical => 3, // 配置或系統錯誤
        };

        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run(cli: &CliConfig, config: &TomlConfig) -> Result<(), CartError> {
    let transport = ReqwestTransport::new(config.base_url(), config.timeout(), config.headers())?;
    let notifier = ConsoleNotifier::new();

    match &cli.command {
        Command::Action { href, data } => {
            let button = data
                .iter()
                .fold(ActionButton::new(href.clone()), |button, (key, value)| {
                    button.with(key.clone(), value.clone())
                });
            let actions = ProductActions::new(transport, notifier, config.confirmation_label());
            actions.perform(&button).await?;
            Ok(())
        }
        Command::Notify { href, product, email } => {
            let mut button = NotifyButton {
                product: *product,
                href: href.clone(),
                label: "Notify me".to_string(),
            };
            let actions = ProductActions::new(transport, notifier, config.confirmation_label());
            let mut form = actions.open_notify_form(&button);
            form.email = email.clone();
            actions.submit_notify(&mut button, &mut form).await?;
            println!("🏷️ {}", button.label);
            Ok(())
        }
        command => run_cart(cli, config, command, transport, notifier).await,
    }
}

async fn run_cart(
    cli: &CliConfig,
    config: &TomlConfig,
    command: &Command,
    transport: ReqwestTransport,
    notifier: ConsoleNotifier,
) -> Result<(), CartError> {
    let snapshot_path = cli.snapshot.as_deref().or(config.snapshot_path());
    let snapshot_path = validate_required_field("cart.snapshot", &snapshot_path)?;
    let file = SnapshotFile::new(*snapshot_path);

    tracing::info!("📁 Loading cart snapshot from: {}", file.path().display());
    let page = CartPage::from_snapshot(file.load()?, config.currency_prefix())?;
    let sync = CartSynchronizer::new(page, transport, notifier, config.sync_settings()?);

    match command {
        Command::Quantity { id, slug, value } => {
            sync.on_quantity_change(&LineKey::new(*id, slug.clone()), value).await?;
        }
        Command::Remove { id, slug } => {
            sync.on_remove_click(&LineKey::new(*id, slug.clone())).await?;
        }
        Command::Confirm => {
            sync.on_confirm_click().await?;
        }
        _ => {
            sync.recompute_totals().await;
        }
    }

    let page = sync.page();
    let page = page.lock().await;
    println!("{}", page.render());

    if cli.write_back {
        file.save(&page.snapshot())?;
        println!("💾 Snapshot updated: {}", file.path().display());
    }

    Ok(())
}
