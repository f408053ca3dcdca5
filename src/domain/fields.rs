//! The closed vocabulary of semantic order fields.

/// How a semantic value is turned into its protocol value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Plain,
    Amount,
    Currency,
    ExpiryDate,
    Country,
    Language,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Semantic key supplied by the caller.
    pub key: &'static str,
    /// Protocol field sent to the gateway.
    pub outbound: &'static str,
    /// Protocol field the gateway uses for the same value in responses.
    pub inbound: Option<&'static str>,
    pub transform: Transform,
}

const fn field(key: &'static str, outbound: &'static str) -> FieldSpec {
    FieldSpec {
        key,
        outbound,
        inbound: None,
        transform: Transform::Plain,
    }
}

const fn echoed(
    key: &'static str,
    outbound: &'static str,
    inbound: &'static str,
    transform: Transform,
) -> FieldSpec {
    FieldSpec {
        key,
        outbound,
        inbound: Some(inbound),
        transform,
    }
}

pub const FIELDS: &[FieldSpec] = &[
    echoed("order", "DS_MERCHANT_ORDER", "Ds_Order", Transform::Plain),
    echoed("merchantCode", "DS_MERCHANT_MERCHANTCODE", "Ds_MerchantCode", Transform::Plain),
    echoed("transactionType", "DS_MERCHANT_TRANSACTIONTYPE", "Ds_TransactionType", Transform::Plain),
    echoed("terminal", "DS_MERCHANT_TERMINAL", "Ds_Terminal", Transform::Plain),
    echoed("currency", "DS_MERCHANT_CURRENCY", "Ds_Currency", Transform::Currency),
    echoed("amount", "DS_MERCHANT_AMOUNT", "Ds_Amount", Transform::Amount),
    field("merchantName", "DS_MERCHANT_MERCHANTNAME"),
    field("merchantURL", "DS_MERCHANT_MERCHANTURL"),
    field("merchantSignature", "DS_MERCHANT_MERCHANTSIGNATURE"),
    field("successURL", "DS_MERCHANT_URLOK"),
    field("errorURL", "DS_MERCHANT_URLKO"),
    field("dateFrequency", "DS_MERCHANT_DATEFRECUENCY"),
    field("chargeExpiryDate", "DS_MERCHANT_CHARGEEXPIRYDATE"),
    field("sumTotal", "DS_MERCHANT_SUMTOTAL"),
    field("directPayment", "DS_MERCHANT_DIRECTPAYMENT"),
    echoed("identifier", "DS_MERCHANT_IDENTIFIER", "Ds_Merchant_Identifier", Transform::Plain),
    field("group", "DS_MERCHANT_GROUP"),
    field("pan", "DS_MERCHANT_PAN"),
    echoed("expiryDate", "DS_MERCHANT_EXPIRYDATE", "Ds_ExpiryDate", Transform::ExpiryDate),
    field("CVV2", "DS_MERCHANT_CVV2"),
    echoed("cardCountry", "DS_CARD_COUNTRY", "Ds_Card_Country", Transform::Country),
    echoed("lang", "DS_MERCHANT_CONSUMERLANGUAGE", "Ds_ConsumerLanguage", Transform::Language),
    echoed("merchantData", "DS_MERCHANT_MERCHANTDATA", "Ds_MerchantData", Transform::Plain),
    field("clientIp", "DS_MERCHANT_CLIENTIP"),
    field("operationId", "DS_MERCHANT_IDOPER"),
    field("payMethods", "DS_MERCHANT_PAYMETHODS"),
    field("productDescription", "DS_MERCHANT_PRODUCTDESCRIPTION"),
    field("taxReference", "DS_MERCHANT_TAX_REFERENCE"),
    field("transactionDate", "DS_MERCHANT_TRANSACTIONDATE"),
    field("merchantDescriptor", "DS_MERCHANT_MERCHANTDESCRIPTOR"),
    field("customerMobile", "DS_MERCHANT_CUSTOMER_MOBILE"),
    field("customerMail", "DS_MERCHANT_CUSTOMER_MAIL"),
    field("cardHolder", "DS_MERCHANT_TITULAR"),
    field("smsTemplate", "DS_MERCHANT_CUSTOMER_SMS_TEXT"),
];

/// Keys consumed while pre-processing; they never reach the payload.
pub const EXPIRY_MONTH: &str = "expiryMonth";
pub const EXPIRY_YEAR: &str = "expiryYear";

pub fn by_key(key: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|f| f.key == key)
}

pub fn by_outbound(outbound: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|f| f.outbound == outbound)
}
