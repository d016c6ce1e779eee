//! Construction of the outgoing payment request for an order.

use std::{collections::BTreeMap, sync::Arc};

use error_stack::{Report, ResultExt};
use url::Url;

use crate::{
    configs::RedirectCheckoutConfig,
    epayment::{
        self,
        request::{Client, PaymentOrder},
        Environment,
    },
    errors::{ConfigurationError, CustomResult, EPaymentError, RequestError},
    events::{EventDispatcher, PaymentRequestEvent},
    order_number::OrderNumberMapper,
    types::Order,
};

/// Callback urls the gateway redirects the customer back to.
///
/// The return url doubles as both the accept and the decline url — the
/// return handler tells success from failure by the response parameters, not
/// by which url was hit.
#[derive(Debug, Clone, Default)]
pub struct CallbackUrls {
    pub return_url: Option<Url>,
    pub cancel_url: Option<Url>,
    pub exception_url: Option<Url>,
}

/// A ready-to-render offsite redirect: POST the form fields to the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectForm {
    pub endpoint: String,
    pub method: http::Method,
    pub form_fields: BTreeMap<String, String>,
}

/// Builds the signed parameter set for the redirect to the hosted payment
/// page.
pub struct PaymentRequestBuilder {
    config: RedirectCheckoutConfig,
    order_numbers: OrderNumberMapper,
    events: Arc<dyn EventDispatcher>,
}

impl PaymentRequestBuilder {
    pub fn new(
        config: RedirectCheckoutConfig,
        order_numbers: OrderNumberMapper,
        events: Arc<dyn EventDispatcher>,
    ) -> Self {
        Self {
            config,
            order_numbers,
            events,
        }
    }

    /// Assemble the signed field set for one payment attempt.
    ///
    /// `language` is the shop's current interface language code (`"de"`);
    /// the hosted payment page locale is derived from it. `extra_parameters`
    /// are merged in last, together with whatever request-event listeners
    /// contribute; neither overrides a core-computed field.
    pub async fn build_request(
        &self,
        order: &Order,
        urls: &CallbackUrls,
        language: &str,
        extra_parameters: BTreeMap<String, String>,
    ) -> CustomResult<BTreeMap<String, String>, RequestError> {
        let environment = self
            .environment(urls)
            .change_context(RequestError::InvalidConfiguration)?;

        let payment_order = PaymentOrder {
            reference: self.order_numbers.remote_order_id(order),
            amount: order.total_price.number,
            currency: order.total_price.currency_code.clone(),
        };

        let address = &order.billing_address;
        let client = Client {
            name: format!("{} {}", address.given_name, address.family_name),
            address: address.address_line1.clone(),
            zip: address.postal_code.clone(),
            town: address.locality.clone(),
            country: address.country_code.clone(),
            email: order.email.clone(),
            locale: locale(language),
        };

        let mut event = PaymentRequestEvent::new(order.clone());
        event.parameters = extra_parameters;
        self.events.payment_request(&mut event).await;

        epayment::request::create_payment(&environment, &client, &payment_order, &event.parameters)
            .map_err(|report| {
                let context = match report.current_context() {
                    EPaymentError::SignatureComputationFailed => RequestError::SigningFailed,
                    _ => RequestError::RequestEncodingFailed,
                };
                report.change_context(context)
            })
    }

    /// The gateway endpoint the request form must be posted to.
    pub fn redirect_url(&self) -> &'static str {
        self.config.gateway_url()
    }

    /// Convenience combining [`build_request`] and [`redirect_url`] into an
    /// offsite redirect form.
    ///
    /// [`build_request`]: Self::build_request
    /// [`redirect_url`]: Self::redirect_url
    pub async fn redirect_form(
        &self,
        order: &Order,
        urls: &CallbackUrls,
        language: &str,
        extra_parameters: BTreeMap<String, String>,
    ) -> CustomResult<RedirectForm, RequestError> {
        let form_fields = self
            .build_request(order, urls, language, extra_parameters)
            .await?;
        Ok(RedirectForm {
            endpoint: self.redirect_url().to_string(),
            method: http::Method::POST,
            form_fields,
        })
    }

    fn environment(&self, urls: &CallbackUrls) -> CustomResult<Environment, ConfigurationError> {
        let return_url = required_url(&urls.return_url, "return")?;
        let cancel_url = required_url(&urls.cancel_url, "cancel")?;
        let exception_url = required_url(&urls.exception_url, "exception")?;

        let mut environment = Environment::from_config(&self.config);
        environment.accept_url = Some(return_url.clone());
        environment.decline_url = Some(return_url);
        environment.cancel_url = Some(cancel_url);
        environment.exception_url = Some(exception_url);
        Ok(environment)
    }
}

impl std::fmt::Debug for PaymentRequestBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentRequestBuilder")
            .field("config", &self.config)
            .finish()
    }
}

fn required_url(
    url: &Option<Url>,
    field_name: &'static str,
) -> CustomResult<String, ConfigurationError> {
    url.as_ref()
        .map(Url::to_string)
        .ok_or_else(|| Report::new(ConfigurationError::MissingCallbackUrl { field_name }))
}

/// The hosted payment page locale, `{lang}_{LANG}` (`de` → `de_DE`).
fn locale(language: &str) -> String {
    format!("{}_{}", language.to_lowercase(), language.to_uppercase())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use masking::Secret;

    use super::*;
    use crate::{
        configs::{Charset, HashAlgorithm, Mode},
        consts,
        events::{MockEventDispatcher, NoopDispatcher},
        storage::MockOrderRepository,
        types::{Address, Price},
    };

    fn config() -> RedirectCheckoutConfig {
        RedirectCheckoutConfig {
            gateway_id: "postfinance".to_string(),
            psp_id: "Gridonic_TEST".to_string(),
            sha_in: Secret::new("S3cr3t!".to_string()),
            sha_out: Secret::new("S3cr3t!".to_string()),
            hash_algorithm: HashAlgorithm::Sha1,
            charset: Charset::Utf8,
            mode: Mode::Test,
            catalog_url: Some("https://shop.example.com/catalog".parse().unwrap()),
            home_url: Some("https://shop.example.com".parse().unwrap()),
        }
    }

    fn builder_with_events(events: Arc<dyn EventDispatcher>) -> PaymentRequestBuilder {
        let orders = MockOrderRepository::new();
        PaymentRequestBuilder::new(
            config(),
            OrderNumberMapper::new(Arc::new(orders)),
            events,
        )
    }

    fn builder() -> PaymentRequestBuilder {
        builder_with_events(Arc::new(NoopDispatcher))
    }

    fn order() -> Order {
        Order::new(
            2467,
            Price::new("20".parse().unwrap(), "CHF"),
            "john.doe@example.com",
            Address {
                given_name: "John".to_string(),
                family_name: "Doe".to_string(),
                address_line1: "Aarbergergasse 40".to_string(),
                postal_code: "3000".to_string(),
                locality: "Bern".to_string(),
                country_code: "CH".to_string(),
            },
        )
    }

    fn urls() -> CallbackUrls {
        CallbackUrls {
            return_url: Some("https://shop.example.com/url/return".parse().unwrap()),
            cancel_url: Some("https://shop.example.com/url/cancel".parse().unwrap()),
            exception_url: Some("https://shop.example.com/url/exception".parse().unwrap()),
        }
    }

    #[tokio::test]
    async fn request_carries_order_client_and_environment_fields() {
        let fields = builder()
            .build_request(&order(), &urls(), "de", BTreeMap::new())
            .await
            .unwrap();

        assert_eq!(fields.get("PSPID").map(String::as_str), Some("Gridonic_TEST"));
        assert_eq!(fields.get("ORDERID").map(String::as_str), Some("2467"));
        assert_eq!(fields.get("AMOUNT").map(String::as_str), Some("2000"));
        assert_eq!(fields.get("CURRENCY").map(String::as_str), Some("CHF"));
        assert_eq!(fields.get("CN").map(String::as_str), Some("John Doe"));
        assert_eq!(fields.get("OWNERZIP").map(String::as_str), Some("3000"));
        assert_eq!(fields.get("LANGUAGE").map(String::as_str), Some("de_DE"));
        assert_eq!(
            fields.get("CATALOGURL").map(String::as_str),
            Some("https://shop.example.com/catalog")
        );
        assert_eq!(
            fields.get("ACCEPTURL").map(String::as_str),
            Some("https://shop.example.com/url/return")
        );
        assert_eq!(
            fields.get("DECLINEURL").map(String::as_str),
            Some("https://shop.example.com/url/return")
        );
        assert_eq!(
            fields.get("CANCELURL").map(String::as_str),
            Some("https://shop.example.com/url/cancel")
        );
        assert_eq!(
            fields.get("EXCEPTIONURL").map(String::as_str),
            Some("https://shop.example.com/url/exception")
        );
        assert!(fields.contains_key("SHASIGN"));
    }

    #[tokio::test]
    async fn remote_reference_includes_the_retry_counter() {
        let mut order = order();
        order.set_data(consts::KEY_NUMBER_MINOR, serde_json::json!(2));

        let fields = builder()
            .build_request(&order, &urls(), "de", BTreeMap::new())
            .await
            .unwrap();
        assert_eq!(fields.get("ORDERID").map(String::as_str), Some("2467-2"));
    }

    #[tokio::test]
    async fn missing_return_url_fails_with_a_configuration_error() {
        let mut urls = urls();
        urls.return_url = None;

        let report = builder()
            .build_request(&order(), &urls, "de", BTreeMap::new())
            .await
            .unwrap_err();

        let configuration_error = report
            .downcast_ref::<ConfigurationError>()
            .expect("configuration error in the report chain");
        assert!(matches!(
            configuration_error,
            ConfigurationError::MissingCallbackUrl {
                field_name: "return"
            }
        ));
    }

    #[tokio::test]
    async fn request_event_is_dispatched_once_and_its_parameters_are_merged() {
        let mut events = MockEventDispatcher::new();
        events
            .expect_payment_request()
            .times(1)
            .returning(|event: &mut PaymentRequestEvent| {
                event.add_parameter("PM", "PostFinance Card");
                event.add_parameter("AMOUNT", "1");
            });

        let fields = builder_with_events(Arc::new(events))
            .build_request(&order(), &urls(), "de", BTreeMap::new())
            .await
            .unwrap();

        assert_eq!(fields.get("PM").map(String::as_str), Some("PostFinance Card"));
        // listener additions never override computed fields
        assert_eq!(fields.get("AMOUNT").map(String::as_str), Some("2000"));
    }

    #[tokio::test]
    async fn redirect_form_posts_to_the_configured_endpoint() {
        let form = builder()
            .redirect_form(&order(), &urls(), "de", BTreeMap::new())
            .await
            .unwrap();
        assert_eq!(
            form.endpoint,
            "https://e-payment.postfinance.ch/ncol/test/orderstandard_utf8.asp"
        );
        assert_eq!(form.method, http::Method::POST);
        assert!(form.form_fields.contains_key("SHASIGN"));
    }
}
