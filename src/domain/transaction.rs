use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};

/// Gateway transaction types (`DS_MERCHANT_TRANSACTIONTYPE`).
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Authorization,
    Preauthorization,
    Confirmation,
    AutoRefund,
    RecurringTransaction,
    SuccessiveTransaction,
    Authentication,
    AuthenticationConfirmation,
    PreauthorizationCancel,
    DeferredPreauthorization,
    DeferredPreauthorizationConfirmation,
    DeferredPreauthorizationCancel,
    InitialRecurring,
    SuccessiveRecurring,
}

impl TransactionType {
    pub const ALL: [TransactionType; 14] = [
        Self::Authorization,
        Self::Preauthorization,
        Self::Confirmation,
        Self::AutoRefund,
        Self::RecurringTransaction,
        Self::SuccessiveTransaction,
        Self::Authentication,
        Self::AuthenticationConfirmation,
        Self::PreauthorizationCancel,
        Self::DeferredPreauthorization,
        Self::DeferredPreauthorizationConfirmation,
        Self::DeferredPreauthorizationCancel,
        Self::InitialRecurring,
        Self::SuccessiveRecurring,
    ];

    /// The code sent on the wire.
    pub fn code(self) -> &'static str {
        match self {
            Self::Authorization => "0",
            Self::Preauthorization => "1",
            Self::Confirmation => "2",
            Self::AutoRefund => "3",
            Self::RecurringTransaction => "5",
            Self::SuccessiveTransaction => "6",
            Self::Authentication => "7",
            Self::AuthenticationConfirmation => "8",
            Self::PreauthorizationCancel => "9",
            Self::DeferredPreauthorization => "O",
            Self::DeferredPreauthorizationConfirmation => "P",
            Self::DeferredPreauthorizationCancel => "Q",
            Self::InitialRecurring => "R",
            Self::SuccessiveRecurring => "S",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }
}

impl From<TransactionType> for crate::domain::order::ParamValue {
    fn from(value: TransactionType) -> Self {
        Self::Text(value.code().to_string())
    }
}

/// Generates an order id the gateway accepts: four digits followed by eight
/// alphanumeric characters.
pub fn random_transaction_id() -> String {
    let mut rng = rand::thread_rng();
    let digits: String = (0..4)
        .map(|_| char::from(b'0' + rng.gen_range(0..10)))
        .collect();
    let tail: String = (&mut rng)
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    format!("{digits}{tail}")
}
