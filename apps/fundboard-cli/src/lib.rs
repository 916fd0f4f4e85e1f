use std::io::{BufRead, Write};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use fundboard_client::{
    FundApi, FundApiClient, FundApiClientConfig, resolve_api_base_url, resolve_timeout_ms,
};
use fundboard_domain::{FundDraft, PageParams, TransferDraft, newest_first, owner_activity};
use fundboard_query::{MutationError, QueryClient, QueryKey};
use fundboard_ui_core::{
    CloseTrigger, ErrorBanner, FormDraft, FormState, FundDetailView, ListView, Modal, ModalKind,
    OwnerDetailView, OwnersView, RESET_FAILED_MESSAGE, SubmitBlocked, TransferRow,
};
use serde::Serialize;
use uuid::Uuid;

mod render;

#[derive(Parser, Debug)]
#[command(name = "fundboard")]
#[command(about = "Terminal dashboard for fund cap tables and unit transfers")]
pub struct FundboardCli {
    /// API base URL. Falls back to FUNDBOARD_API_URL, then http://127.0.0.1:8080/api.
    #[arg(long, global = true)]
    pub api_url: Option<String>,
    /// Request timeout in milliseconds. Falls back to FUNDBOARD_API_TIMEOUT_MS.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,
    /// Print raw JSON payloads instead of rendered views.
    #[arg(long, global = true)]
    pub json: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List, create and inspect funds
    #[command(subcommand)]
    Funds(FundsCommand),
    /// Show a fund's cap table
    CapTable(CapTableArgs),
    /// List and execute unit transfers
    #[command(subcommand)]
    Transfers(TransfersCommand),
    /// Owners across all funds
    #[command(subcommand)]
    Owners(OwnersCommand),
    /// Delete all funds, cap tables and transfers
    Reset(ResetArgs),
}

#[derive(Subcommand, Debug)]
pub enum FundsCommand {
    List(PageArgs),
    Create(CreateFundArgs),
    /// Fund details, cap table and transfer history
    Show { fund_id: Uuid },
}

#[derive(Args, Debug, Clone, Copy, Default)]
pub struct PageArgs {
    #[arg(long)]
    pub limit: Option<u32>,
    #[arg(long)]
    pub offset: Option<u32>,
}

impl PageArgs {
    fn page(self) -> Result<PageParams> {
        PageParams::new(self.limit, self.offset).map_err(|error| anyhow!(error))
    }
}

#[derive(Args, Debug)]
pub struct CreateFundArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub total_units: String,
    #[arg(long)]
    pub initial_owner: String,
}

#[derive(Args, Debug)]
pub struct CapTableArgs {
    pub fund_id: Uuid,
    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Subcommand, Debug)]
pub enum TransfersCommand {
    List { fund_id: Uuid },
    Create(CreateTransferArgs),
}

#[derive(Args, Debug)]
pub struct CreateTransferArgs {
    pub fund_id: Uuid,
    #[arg(long = "from")]
    pub from_owner: String,
    #[arg(long = "to")]
    pub to_owner: String,
    #[arg(long, default_value = "1")]
    pub units: String,
    /// Reuse a key to safely retry a transfer. A random key is used otherwise.
    #[arg(long)]
    pub idempotency_key: Option<Uuid>,
}

#[derive(Subcommand, Debug)]
pub enum OwnersCommand {
    List,
    /// One owner's holding and transfer timeline in a fund
    Show { fund_id: Uuid, owner: String },
}

#[derive(Args, Debug)]
pub struct ResetArgs {
    /// Skip the confirmation prompt
    #[arg(long)]
    pub yes: bool,
}

struct Output {
    json: bool,
}

impl Output {
    fn emit<T: Serialize + ?Sized>(&self, payload: &T, rendered: impl FnOnce() -> String) -> Result<()> {
        if self.json {
            let text =
                serde_json::to_string_pretty(payload).context("failed to render JSON output")?;
            println!("{text}");
        } else {
            println!("{}", rendered());
        }
        Ok(())
    }
}

pub async fn run(cli: FundboardCli) -> Result<()> {
    let base = resolve_api_base_url(cli.api_url.as_deref())?;
    let timeout_ms = resolve_timeout_ms(cli.timeout_ms)?;
    tracing::debug!(base_url = %base.base_url, source = %base.source, timeout_ms, "resolved api configuration");

    let api = FundApiClient::new(FundApiClientConfig {
        base_url: base.base_url,
        timeout_ms,
    })?;
    let client = QueryClient::new(api);
    let output = Output { json: cli.json };

    match cli.command {
        Commands::Funds(FundsCommand::List(page)) => list_funds(&client, &output, page).await,
        Commands::Funds(FundsCommand::Create(args)) => create_fund(&client, &output, args).await,
        Commands::Funds(FundsCommand::Show { fund_id }) => {
            show_fund(&client, &output, fund_id).await
        }
        Commands::CapTable(args) => show_cap_table(&client, &output, args).await,
        Commands::Transfers(TransfersCommand::List { fund_id }) => {
            list_transfers(&client, &output, fund_id).await
        }
        Commands::Transfers(TransfersCommand::Create(args)) => {
            create_transfer(&client, &output, args).await
        }
        Commands::Owners(OwnersCommand::List) => list_owners(&client, &output).await,
        Commands::Owners(OwnersCommand::Show { fund_id, owner }) => {
            show_owner(&client, &output, fund_id, &owner).await
        }
        Commands::Reset(args) => reset(&client, &output, &args).await,
    }
}

async fn list_funds<A: FundApi>(
    client: &QueryClient<A>,
    output: &Output,
    page: PageArgs,
) -> Result<()> {
    let page = page.page()?;
    let result = client.fund_list(page).await;
    let state = client.state(&QueryKey::FundList(page));
    let rows = result.as_ref().ok().map(|list| list.funds.clone());
    let view = ListView::from_query(&state, rows);

    match result {
        Ok(list) => output.emit(&list, || render::fund_list(&view)),
        Err(error) => {
            if !output.json {
                println!("{}", render::fund_list(&view));
            }
            Err(anyhow!(error))
        }
    }
}

async fn show_fund<A: FundApi>(
    client: &QueryClient<A>,
    output: &Output,
    fund_id: Uuid,
) -> Result<()> {
    let fund = client.fund(fund_id).await?;
    let cap_table = client.cap_table(fund_id).await?;
    let transfers = client.transfers(fund_id).await?;

    let payload = serde_json::json!({
        "fund": fund,
        "capTable": cap_table,
        "transfers": transfers,
    });
    output.emit(&payload, || {
        render::fund_detail(&FundDetailView::build(
            &fund,
            &cap_table,
            &transfers.transfers,
        ))
    })
}

async fn show_cap_table<A: FundApi>(
    client: &QueryClient<A>,
    output: &Output,
    args: CapTableArgs,
) -> Result<()> {
    let page = args.page.page()?;
    let fund = client.fund(args.fund_id).await?;
    let cap_table = if page == PageParams::default() {
        client.cap_table(args.fund_id).await?
    } else {
        client.api().get_cap_table(args.fund_id, page).await?
    };
    output.emit(&cap_table, || {
        let view = FundDetailView::build(&fund, &cap_table, &[]);
        format!(
            "{} cap table ({} of {} owners)\n{}",
            fund.name,
            cap_table.entries.len(),
            cap_table.total,
            render::cap_table_rows(&view.cap_table)
        )
    })
}

async fn list_transfers<A: FundApi>(
    client: &QueryClient<A>,
    output: &Output,
    fund_id: Uuid,
) -> Result<()> {
    let transfers = client.transfers(fund_id).await?;
    output.emit(&transfers, || {
        let rows: Vec<TransferRow> = newest_first(&transfers.transfers)
            .iter()
            .map(TransferRow::new)
            .collect();
        render::transfer_rows(&rows)
    })
}

fn blocked(blocked: SubmitBlocked) -> anyhow::Error {
    match blocked {
        SubmitBlocked::InFlight => anyhow!(blocked),
        SubmitBlocked::Invalid(fields) => {
            anyhow!("invalid input\n{}", render::failure(None, &fields))
        }
    }
}

fn rejected<D: FormDraft>(form: &FormState<D>, error: &MutationError) -> anyhow::Error {
    let detail = render::failure(form.banner(), form.field_errors());
    if detail.is_empty() {
        anyhow!(error.clone())
    } else {
        anyhow!(detail)
    }
}

async fn create_fund<A: FundApi>(
    client: &QueryClient<A>,
    output: &Output,
    args: CreateFundArgs,
) -> Result<()> {
    let mut form = FormState::new(FundDraft {
        name: args.name,
        total_units: args.total_units,
        initial_owner: args.initial_owner,
    });
    form.begin_submit().map_err(blocked)?;

    let draft = form.draft.clone();
    let outcome = client.create_fund(&draft).await;
    form.finish(&outcome);
    match outcome {
        Ok(fund) => output.emit(&fund, || render::fund_created(&fund)),
        Err(error) => Err(rejected(&form, &error)),
    }
}

async fn create_transfer<A: FundApi>(
    client: &QueryClient<A>,
    output: &Output,
    args: CreateTransferArgs,
) -> Result<()> {
    let mut form = FormState::new(TransferDraft {
        from_owner: args.from_owner,
        to_owner: args.to_owner,
        units: args.units,
    });
    form.begin_submit().map_err(blocked)?;

    let idempotency_key = args.idempotency_key.unwrap_or_else(Uuid::new_v4);
    tracing::debug!(fund_id = %args.fund_id, idempotency_key = %idempotency_key, "submitting transfer");

    // Seed the cap table so the optimistic update has something to adjust.
    if let Err(error) = client.cap_table(args.fund_id).await {
        tracing::debug!(fund_id = %args.fund_id, code = %error.code, "cap table unavailable before transfer");
    }

    let draft = form.draft.clone();
    let outcome = client
        .create_transfer(args.fund_id, &draft, Some(idempotency_key))
        .await;
    form.finish(&outcome);

    match outcome {
        Ok(created) => {
            if output.json {
                return output.emit(&created, String::new);
            }
            let fund = client.fund(args.fund_id).await?;
            let cap_table = client.cap_table(args.fund_id).await?;
            let view = FundDetailView::build(&fund, &cap_table, &[]);
            println!(
                "{}\nIdempotency key: {idempotency_key}\n\n{}",
                render::transfer_created(&created),
                render::cap_table_rows(&view.cap_table)
            );
            Ok(())
        }
        Err(error) => Err(rejected(&form, &error)),
    }
}

async fn list_owners<A: FundApi>(client: &QueryClient<A>, output: &Output) -> Result<()> {
    let owners = client.owners().await?;
    output.emit(&owners, || render::owners(&OwnersView::build(&owners)))
}

async fn show_owner<A: FundApi>(
    client: &QueryClient<A>,
    output: &Output,
    fund_id: Uuid,
    owner: &str,
) -> Result<()> {
    let fund = client.fund(fund_id).await?;
    let cap_table = client.cap_table(fund_id).await?;
    let transfers = client.transfers(fund_id).await?;

    let Some(entry) = cap_table.entry(owner) else {
        bail!("{owner} holds no units in {}", fund.name);
    };
    let activity = owner_activity(owner, entry, fund.total_units, &transfers.transfers);
    output.emit(&activity, || {
        render::owner_detail(&OwnerDetailView::build(&fund, &activity))
    })
}

fn confirm_reset(input: &mut impl BufRead, prompt: &mut impl Write) -> Result<bool> {
    write!(
        prompt,
        "This deletes every fund, cap table and transfer. Continue? [y/N] "
    )?;
    prompt.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

async fn reset<A: FundApi>(client: &QueryClient<A>, output: &Output, args: &ResetArgs) -> Result<()> {
    let mut modal = Modal::new();
    modal.open(ModalKind::ResetConfirm);

    if !args.yes {
        let confirmed = confirm_reset(&mut std::io::stdin().lock(), &mut std::io::stderr())?;
        if !confirmed {
            modal.close(CloseTrigger::Cancel);
            eprintln!("Reset cancelled.");
            return Ok(());
        }
    }

    modal.begin_action();
    let outcome = client.reset().await;
    modal.finish_action(outcome.is_ok());

    match outcome {
        Ok(summary) => output.emit(&summary, || render::reset_summary(&summary)),
        Err(MutationError::Api(error)) => Err(anyhow!(
            "{}",
            ErrorBanner::from_api(&error, RESET_FAILED_MESSAGE)
        )),
        Err(error) => Err(anyhow!(error)),
    }
}
