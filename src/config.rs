use std::{env, net::{SocketAddr, ToSocketAddrs as _}, str::FromStr};

use sea_orm::ConnectOptions;
use tracing::info;

use crate::payroll::PayrollPolicy;

pub struct Config {
    pub host_address: SocketAddr,

    pub database_opt: ConnectOptions,

    pub jwt_key: String,

    pub policy: PayrollPolicy,
}

pub fn load() -> Config {
    Config {
        host_address: load_host_address(),
        database_opt: load_database_opt().into(),
        jwt_key: load_jwt_key(),
        policy: load_policy(),
    }
}

fn load_host_address() -> SocketAddr {
    info!("Loading environment `HOST_ADDRESS`");

    let var = env::var("HOST_ADDRESS").unwrap_or_else(|_| "127.0.0.1:0".to_string());

    var.to_socket_addrs()
        .expect("`HOST_ADDRESS` is not in a valid format").nth(0)
        .expect("unable to resolve host from `HOST_ADDRESS`")
}

fn load_database_opt() -> impl Into<ConnectOptions> {
    info!("Loading environment `DATABASE_URL`");

    let var = env::var("DATABASE_URL").expect("Environment `DATABASE_URL` is required to be set");

    var
}

fn load_jwt_key() -> String {
    info!("Loading environment `JWT_SECRET`");

    let var = env::var("JWT_SECRET").expect("Environment `JWT_SECRET` is required to be set");

    var
}

fn load_policy() -> PayrollPolicy {
    info!("Loading payroll policy overrides from environment");

    let defaults = PayrollPolicy::default();

    PayrollPolicy {
        pf_rate: env_parse("PF_RATE").unwrap_or(defaults.pf_rate),
        prof_tax_threshold: env_parse("PROF_TAX_THRESHOLD").unwrap_or(defaults.prof_tax_threshold),
        prof_tax_amount: env_parse("PROF_TAX_AMOUNT").unwrap_or(defaults.prof_tax_amount),
        min_active_hours: env_parse("MIN_ACTIVE_HOURS").unwrap_or(defaults.min_active_hours),
        business_days_only: env_parse("BUSINESS_DAYS_ONLY").unwrap_or(defaults.business_days_only),
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    let var = env::var(name).ok()?;

    var.parse()
        .map_err(|_| panic!("Environment `{name}` is not in a valid format"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn test_policy_defaults() {
        let policy = PayrollPolicy::default();

        assert_eq!(policy.pf_rate, dec!(0.12));
        assert_eq!(policy.prof_tax_threshold, dec!(15000));
        assert_eq!(policy.prof_tax_amount, dec!(200));
        assert!(policy.business_days_only);
    }

    #[test]
    fn test_env_parse() {
        unsafe { env::set_var("TEST_PF_RATE", "0.10") };

        assert_eq!(env_parse::<Decimal>("TEST_PF_RATE"), Some(dec!(0.10)));
        assert_eq!(env_parse::<Decimal>("TEST_PF_RATE_MISSING"), None);
    }
}
