use std::io::Write;
use std::path::{Path, PathBuf};

use eyre::{bail, eyre, WrapErr};
use jiff::Timestamp;
use ncp_cli::config::{self, CognitoSettings, NcpConfig};
use ncp_cli::input::{self, AssessmentSource};
use ncp_cli::{render, session};
use ncp_client::{ClientError, NcpClient, Operations, PendingOperation};
use ncp_core::models::care_plan::{CarePlanUpdate, FormatType, ValidateNcpRequest};
use ncp_core::models::transaction::ProviderKind;
use ncp_core::models::user::AdminLevel;
use ncp_core::progress::OperationKind;
use ncp_export::styles::DocumentStyles;
use ncp_export::ExportFormat;
use tracing::{debug, info};
use uuid::Uuid;

use crate::cli::{AdminCommand, AssessmentArgs, Cli, Command, ConfigCommand};

struct Context {
    config: NcpConfig,
    client: NcpClient,
}

impl Context {
    async fn open(api_url: Option<String>) -> eyre::Result<Self> {
        let dir = config::config_dir()?;
        let mut config = config::load_config(&dir)?;
        let url = config.resolve_api_url(api_url);

        let (token, changed) = session::current_token(&mut config).await;
        if changed {
            config::save_config(&dir, &config)?;
        }

        let mut client = NcpClient::new(url).map_err(friendly)?;
        client.set_token(token);
        debug!(api = client.base_url(), "client ready");
        Ok(Self { config, client })
    }
}

/// Turn a client error into a report carrying the user-facing message and
/// any per-field problems.
fn friendly(e: ClientError) -> eyre::Report {
    match e.field_errors().filter(|f| !f.is_empty()) {
        Some(fields) => eyre!("{}\n{}", e.user_message(), render::field_errors(fields)),
        None => eyre!(e.user_message()),
    }
}

pub async fn run(cli: Cli) -> eyre::Result<()> {
    let api_url = cli.api_url;
    match cli.command {
        Command::Config(cmd) => run_config(cmd, api_url),
        Command::Check(args) => check(&args),
        Command::Login { email, password } => login(&email, &password).await,
        Command::Logout => logout().await,
        Command::Signup {
            email,
            password,
            first_name,
            last_name,
        } => {
            let request = session::sign_up_request(&email, &password, first_name, last_name)?;
            let cognito = session::connect(&cognito_settings(&load_local()?.1)?).await;
            ncp_auth::flows::sign_up(&cognito, &request).await.wrap_err("sign-up failed")?;
            println!(
                "Account created. Check {} for a confirmation code, then run `ncp confirm`.",
                request.email
            );
            Ok(())
        }
        Command::Confirm { email, code } => {
            let cognito = session::connect(&cognito_settings(&load_local()?.1)?).await;
            ncp_auth::flows::confirm_sign_up(&cognito, email.trim(), code.trim())
                .await
                .wrap_err("confirmation failed")?;
            println!("Account confirmed. Run `ncp login` to sign in.");
            Ok(())
        }
        Command::ResetPassword {
            email,
            code,
            new_password,
        } => reset_password(email.trim(), code, new_password).await,
        Command::Whoami => whoami().await,
        Command::Generate { assessment, format } => {
            let ctx = Context::open(api_url).await?;
            generate(&ctx, &assessment, format).await
        }
        Command::List => {
            let ctx = Context::open(api_url).await?;
            let plans = ctx.client.list_ncps().await.map_err(friendly)?;
            if plans.is_empty() {
                println!("No care plans saved yet.");
            }
            for plan in &plans {
                println!("{}", render::plan_row(plan));
            }
            Ok(())
        }
        Command::Show { id } => {
            let ctx = Context::open(api_url).await?;
            let plan = ctx.client.get_ncp(id).await.map_err(friendly)?;
            print!("{}", render::plan_text(&plan));
            Ok(())
        }
        Command::Rename { id, title } => {
            let ctx = Context::open(api_url).await?;
            let update = CarePlanUpdate {
                title: Some(title),
                ..Default::default()
            };
            let plan = ctx.client.update_ncp(id, &update).await.map_err(friendly)?;
            println!("Renamed to \"{}\"", plan.title);
            Ok(())
        }
        Command::Delete { id } => {
            let ctx = Context::open(api_url).await?;
            ctx.client.delete_ncp(id).await.map_err(friendly)?;
            println!("Deleted {id}");
            Ok(())
        }
        Command::Validate { id } => {
            let ctx = Context::open(api_url).await?;
            let plan = ctx.client.get_ncp(id).await.map_err(friendly)?;
            let result = ctx
                .client
                .validate_ncp(&ValidateNcpRequest::from(&plan))
                .await
                .map_err(friendly)?;
            print!("{}", render::validation_text(&result));
            Ok(())
        }
        Command::Explain { id, regenerate } => {
            let ctx = Context::open(api_url).await?;
            explain(&ctx, id, regenerate).await
        }
        Command::Export {
            id,
            format,
            output,
            no_explanation,
            remote,
        } => {
            let ctx = Context::open(api_url).await?;
            export(&ctx, id, &format, output, !no_explanation, remote).await
        }
        Command::Admin(cmd) => {
            let ctx = Context::open(api_url).await?;
            admin(&ctx.client, cmd).await
        }
    }
}

fn run_config(cmd: ConfigCommand, api_url: Option<String>) -> eyre::Result<()> {
    let dir = config::config_dir()?;
    let mut cfg = config::load_config(&dir)?;
    match cmd {
        ConfigCommand::Show => {
            println!("config:  {}", dir.join("config.json").display());
            println!("api url: {}", cfg.resolve_api_url(api_url));
            println!("format:  {} columns", cfg.format());
            match &cfg.cognito {
                Some(c) => println!("cognito: {} ({}, client {})", c.user_pool_id, c.region, c.client_id),
                None => println!("cognito: not configured"),
            }
            match &cfg.session {
                Some(s) => println!(
                    "session: {} (token {}, expires {})",
                    s.email,
                    config::redact_token(&s.id_token),
                    s.expires_at
                ),
                None => println!("session: signed out"),
            }
            return Ok(());
        }
        ConfigCommand::SetUrl { url } => {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                bail!("API URL must start with http:// or https://");
            }
            cfg.api_url = url.trim_end_matches('/').to_string();
        }
        ConfigCommand::SetFormat { format } => {
            let format = FormatType::try_from(format)?;
            cfg.default_format = format.as_u8();
        }
        ConfigCommand::SetCognito {
            region,
            user_pool_id,
            client_id,
        } => {
            cfg.cognito = Some(CognitoSettings {
                region,
                user_pool_id,
                client_id,
            });
        }
    }
    config::save_config(&dir, &cfg)?;
    println!("Saved.");
    Ok(())
}

fn check(args: &AssessmentArgs) -> eyre::Result<()> {
    let assessment = input::read_assessment(source(args))?;
    let report = assessment.validate();
    if report.is_valid() {
        println!("Assessment ({} mode) passes all input rules.", assessment.mode_name());
        return Ok(());
    }
    bail!("Assessment has problems:\n{}", render::field_errors(&report.messages()))
}

fn source(args: &AssessmentArgs) -> AssessmentSource<'_> {
    AssessmentSource {
        json: args.input.as_deref(),
        subjective: args.subjective.as_deref(),
        objective: args.objective.as_deref(),
    }
}

fn load_local() -> eyre::Result<(PathBuf, NcpConfig)> {
    let dir = config::config_dir()?;
    let cfg = config::load_config(&dir)?;
    Ok((dir, cfg))
}

fn cognito_settings(cfg: &NcpConfig) -> eyre::Result<CognitoSettings> {
    cfg.cognito
        .clone()
        .ok_or_else(|| eyre!("Cognito is not configured; run `ncp config set-cognito` first"))
}

async fn login(email: &str, password: &str) -> eyre::Result<()> {
    let (dir, mut cfg) = load_local()?;
    let cognito = session::connect(&cognito_settings(&cfg)?).await;
    let issued = ncp_auth::flows::sign_in(&cognito, email, password)
        .await
        .wrap_err("sign-in failed")?;
    cfg.session = Some(session::stored_session(email, &issued, Timestamp::now()));
    config::save_config(&dir, &cfg)?;

    info!(email, "signed in");
    println!("Signed in as {email}");
    Ok(())
}

async fn logout() -> eyre::Result<()> {
    let dir = config::config_dir()?;
    let mut cfg = config::load_config(&dir)?;
    let Some(stored) = cfg.session.take() else {
        println!("Not signed in.");
        return Ok(());
    };

    if let Some(settings) = &cfg.cognito {
        let cognito = session::connect(settings).await;
        if let Err(e) = ncp_auth::flows::sign_out(&cognito, &stored.access_token).await {
            tracing::warn!(error = %e, "could not revoke tokens");
        }
    }
    config::save_config(&dir, &cfg)?;
    println!("Signed out.");
    Ok(())
}

async fn reset_password(email: &str, code: Option<String>, new_password: Option<String>) -> eyre::Result<()> {
    let cognito = session::connect(&cognito_settings(&load_local()?.1)?).await;
    match (code, new_password) {
        (Some(code), Some(password)) => {
            session::check_password(&password)?;
            ncp_auth::flows::confirm_forgot_password(&cognito, email, code.trim(), &password)
                .await
                .wrap_err("password reset failed")?;
            println!("Password changed. Run `ncp login` to sign in.");
        }
        _ => {
            ncp_auth::flows::forgot_password(&cognito, email)
                .await
                .wrap_err("password reset request failed")?;
            println!("Reset code sent to {email}. Run `ncp reset-password --code <code>` to finish.");
        }
    }
    Ok(())
}

async fn whoami() -> eyre::Result<()> {
    let (dir, mut cfg) = load_local()?;
    let settings = cognito_settings(&cfg)?;
    let (_, changed) = session::current_token(&mut cfg).await;
    if changed {
        config::save_config(&dir, &cfg)?;
    }
    let Some(stored) = &cfg.session else {
        bail!("Not signed in; run `ncp login` first");
    };

    let cognito = session::connect(&settings).await;
    let profile = ncp_auth::flows::get_user(&cognito, &stored.access_token)
        .await
        .wrap_err("could not load profile")?;
    print!("{}", render::profile_text(&profile));
    Ok(())
}

/// Wait for `pending`, redrawing its progress every tick. Ctrl-C cancels.
async fn with_progress<T>(ops: &Operations, pending: PendingOperation<T>) -> Result<T, ClientError> {
    let id = pending.id();
    let mut ticker = ops.ticker();
    let wait = pending.wait();
    tokio::pin!(wait);

    let result = loop {
        tokio::select! {
            result = &mut wait => break result,
            snapshots = ticker.tick() => {
                if let Some(snapshot) = snapshots.iter().find(|s| s.id == id) {
                    eprint!("\r{}", render::progress_line(snapshot));
                    let _ = std::io::stderr().flush();
                }
            }
            _ = tokio::signal::ctrl_c() => {
                ops.cancel(id);
            }
        }
    };

    if let Some(snapshot) = ops.snapshot(id) {
        eprintln!("\r{}", render::progress_line(&snapshot));
    } else {
        eprintln!();
    }
    ops.remove(id);
    result
}

async fn generate(ctx: &Context, args: &AssessmentArgs, format: Option<u8>) -> eyre::Result<()> {
    let assessment = input::read_assessment(source(args))?;
    let format = input::resolve_format(format, &ctx.config)?;

    let ops = Operations::new();
    let client = ctx.client.clone();
    let pending = ops.start(OperationKind::NcpGeneration, async move {
        client.generate_from_input(&assessment, format).await
    });
    let outcome = with_progress(&ops, pending).await.map_err(friendly)?;

    print!("{}", render::outcome_text(&outcome));
    if let Some(plan) = outcome.plan() {
        println!("\nSaved as {}", plan.id);
    }
    Ok(())
}

async fn explain(ctx: &Context, id: Uuid, regenerate: bool) -> eyre::Result<()> {
    let plan = ctx.client.get_ncp(id).await.map_err(friendly)?;

    let existing = if regenerate {
        None
    } else {
        ctx.client.get_explanation(id).await.map_err(friendly)?
    };
    let explanation = match existing {
        Some(explanation) => explanation,
        None => {
            let ops = Operations::new();
            let client = ctx.client.clone();
            let pending = ops.start(OperationKind::ExplanationGeneration, async move {
                client.generate_explanation(id).await
            });
            with_progress(&ops, pending).await.map_err(friendly)?
        }
    };

    print!("{}", render::explanation_text(&plan, &explanation));
    Ok(())
}

async fn export(
    ctx: &Context,
    id: Uuid,
    format: &str,
    output: Option<PathBuf>,
    with_explanation: bool,
    remote: bool,
) -> eyre::Result<()> {
    let format: ExportFormat = format.parse()?;
    let plan = ctx.client.get_ncp(id).await.map_err(friendly)?;
    let path = output.unwrap_or_else(|| PathBuf::from(ncp_export::file_name(&plan, format)));

    let bytes = if remote {
        ctx.client
            .export_ncp(id, format.extension(), with_explanation)
            .await
            .map_err(friendly)?
    } else {
        let explanation = if with_explanation {
            ctx.client.get_explanation(id).await.map_err(friendly)?
        } else {
            None
        };
        tokio::task::spawn_blocking(move || {
            ncp_export::export(&plan, explanation.as_ref(), format, &DocumentStyles::default())
        })
        .await??
    };

    write_output(&path, &bytes)?;
    println!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

fn write_output(path: &Path, bytes: &[u8]) -> eyre::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes).wrap_err_with(|| format!("failed to write {}", path.display()))
}

async fn admin(client: &NcpClient, cmd: AdminCommand) -> eyre::Result<()> {
    match cmd {
        AdminCommand::Stats => {
            let stats = client.dashboard_stats().await.map_err(friendly)?;
            print!("{}", render::stats_text(&stats));
        }
        AdminCommand::Users => {
            let users = client.list_users().await.map_err(friendly)?;
            print!("{}", render::users_table(&users));
        }
        AdminCommand::Suspend { user_id } => {
            let result = client.set_user_suspended(&user_id, true).await.map_err(friendly)?;
            println!("{}", result.message);
        }
        AdminCommand::Activate { user_id } => {
            let result = client.set_user_suspended(&user_id, false).await.map_err(friendly)?;
            println!("{}", result.message);
        }
        AdminCommand::DeleteUser { user_id } => {
            let result = client.delete_user(&user_id).await.map_err(friendly)?;
            println!("{}", result.message);
        }
        AdminCommand::Promote { user_id, super_admin } => {
            let level = if super_admin { AdminLevel::Super } else { AdminLevel::Regular };
            let result = client.set_admin_role(&user_id, true, level).await.map_err(friendly)?;
            println!("{}", result.message);
        }
        AdminCommand::Demote { user_id } => {
            let result = client
                .set_admin_role(&user_id, false, AdminLevel::Regular)
                .await
                .map_err(friendly)?;
            println!("{}", result.message);
        }
        AdminCommand::Health => {
            let health = client.system_health().await.map_err(friendly)?;
            print!("{}", render::health_text(&health));
        }
        AdminCommand::Provider { set: None } => {
            let status = client.ai_provider().await.map_err(friendly)?;
            let available: Vec<_> = status.available_providers.iter().map(|p| p.as_str()).collect();
            println!("Active provider: {}", status.provider);
            println!("Available: {}", available.join(", "));
        }
        AdminCommand::Provider { set: Some(name) } => {
            let provider: ProviderKind = name.parse().map_err(|e: String| eyre!(e))?;
            let changed = client.set_ai_provider(provider).await.map_err(friendly)?;
            println!("{}", changed.message);
        }
    }
    Ok(())
}
