use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result, WrapErr, miette};
use redsys::application::notification::MerchantNotification;
use redsys::interfaces::soap::{self, SoapVariant};
use redsys::logging::{LogFormat, init_logging};
use redsys::{ClientConfig, GatewayUrls, OrderParameters, PRODUCTION_URLS, Redsys, SANDBOX_URLS};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Base64-encoded merchant secret
    #[arg(long, env = "REDSYS_SECRET_KEY", hide_env_values = true, global = true)]
    secret_key: Option<String>,

    /// Gateway environment providing the default endpoints
    #[arg(long, value_enum, default_value_t = Environment::Sandbox, global = true)]
    environment: Environment,

    /// Overrides the redirect endpoint
    #[arg(long, global = true)]
    redirect_url: Option<String>,

    /// Overrides the web-service endpoint
    #[arg(long, global = true)]
    ws_url: Option<String>,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Environment {
    Sandbox,
    Production,
}

#[derive(Clone, Copy, ValueEnum)]
enum Envelope {
    Bare,
    Soap11,
    Soap12,
}

impl From<Envelope> for SoapVariant {
    fn from(envelope: Envelope) -> Self {
        match envelope {
            Envelope::Bare => SoapVariant::Bare,
            Envelope::Soap11 => SoapVariant::Soap11,
            Envelope::Soap12 => SoapVariant::Soap12,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Signs TEXT under the key derived from ORDER
    Sign {
        #[arg(long)]
        order: String,
        text: String,
    },
    /// Builds a signed redirect form from an order parameters JSON file
    Redirect {
        #[arg(long)]
        order_file: PathBuf,
    },
    /// Builds the signed web-service request document for an order
    PetitionRequest {
        #[arg(long)]
        order_file: PathBuf,
    },
    /// Verifies a merchant notification (JSON or urlencoded form fields)
    VerifyNotification { file: PathBuf },
    /// Verifies a SOAP notification, bare or inside a SOAP envelope
    VerifySoapNotification { file: PathBuf },
    /// Prints the signed acknowledgment for a SOAP notification
    SoapAnswer {
        #[arg(long)]
        order: String,
        /// Answer KO instead of OK
        #[arg(long)]
        reject: bool,
        #[arg(long, value_enum, default_value_t = Envelope::Bare)]
        envelope: Envelope,
    },
    /// Prints a random order id
    TransactionId,
}

impl Cli {
    fn client(&self) -> Result<Redsys> {
        let secret = self
            .secret_key
            .clone()
            .ok_or_else(|| miette!("a secret key is required (--secret-key or REDSYS_SECRET_KEY)"))?;
        let mut urls = GatewayUrls::from(match self.environment {
            Environment::Sandbox => SANDBOX_URLS,
            Environment::Production => PRODUCTION_URLS,
        });
        if let Some(url) = &self.redirect_url {
            urls.redirect = url.clone();
        }
        if let Some(url) = &self.ws_url {
            urls.web_service = url.clone();
        }
        Redsys::new(ClientConfig::new(secret, urls)).into_diagnostic()
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("cannot read {}", path.display()))
}

fn read_order(path: &Path) -> Result<OrderParameters> {
    serde_json::from_str(&read(path)?).into_diagnostic()
}

fn read_notification(path: &Path) -> Result<MerchantNotification> {
    let body = read(path)?;
    let body = body.trim();
    if body.starts_with('{') {
        return serde_json::from_str(body).into_diagnostic();
    }
    let mut notification = MerchantNotification::default();
    for (key, value) in url::form_urlencoded::parse(body.as_bytes()) {
        let value = Some(value.into_owned());
        match key.as_ref() {
            "Ds_SignatureVersion" => notification.signature_version = value,
            "Ds_MerchantParameters" => notification.merchant_parameters = value,
            "Ds_Signature" => notification.signature = value,
            _ => {}
        }
    }
    Ok(notification)
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_format).into_diagnostic()?;

    match &cli.command {
        Command::Sign { order, text } => {
            println!("{}", cli.client()?.sign_order_text(order, text).into_diagnostic()?);
        }
        Command::Redirect { order_file } => {
            let params = read_order(order_file)?;
            print_json(&cli.client()?.redirect_petition(&params).into_diagnostic()?)?;
        }
        Command::PetitionRequest { order_file } => {
            let params = read_order(order_file)?;
            println!("{}", cli.client()?.xml_petition_signed_data(&params).into_diagnostic()?);
        }
        Command::VerifyNotification { file } => {
            let notification = read_notification(file)?;
            let response = cli.client()?.process_notification(&notification).into_diagnostic()?;
            print_json(&response)?;
        }
        Command::VerifySoapNotification { file } => {
            let (variant, message) = soap::unwrap_notification(&read(file)?).into_diagnostic()?;
            tracing::debug!(?variant, "unwrapped SOAP notification");
            let response = cli.client()?.process_soap_notification(&message).into_diagnostic()?;
            print_json(&response)?;
        }
        Command::SoapAnswer {
            order,
            reject,
            envelope,
        } => {
            let answer = cli
                .client()?
                .soap_notification_answer(order, !reject)
                .into_diagnostic()?;
            println!("{}", soap::wrap_answer((*envelope).into(), &answer));
        }
        Command::TransactionId => println!("{}", redsys::random_transaction_id()),
    }

    Ok(())
}
