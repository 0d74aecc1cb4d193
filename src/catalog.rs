use bigdecimal::BigDecimal;
use serde::Serialize;

/// A purchasable data bundle. Prices are carried in minor units (pesewas)
/// so the catalog stays free of decimal literals.
#[derive(Debug, Clone, Copy)]
pub struct BundlePlan {
    pub network_id: i32,
    pub plan_id: &'static str,
    pub name: &'static str,
    price_minor: i64,
}

impl BundlePlan {
    pub fn price(&self) -> BigDecimal {
        BigDecimal::from(self.price_minor) / BigDecimal::from(100)
    }
}

#[derive(Debug, Serialize)]
pub struct BundlePlanView {
    pub network_id: i32,
    pub plan_id: &'static str,
    pub name: &'static str,
    pub price: BigDecimal,
}

impl From<&BundlePlan> for BundlePlanView {
    fn from(plan: &BundlePlan) -> Self {
        Self {
            network_id: plan.network_id,
            plan_id: plan.plan_id,
            name: plan.name,
            price: plan.price(),
        }
    }
}

const fn plan(network_id: i32, plan_id: &'static str, name: &'static str, price_minor: i64) -> BundlePlan {
    BundlePlan {
        network_id,
        plan_id,
        name,
        price_minor,
    }
}

/// Static plan table keyed by the provider's network ids
/// (1 = AirtelTigo, 4 = MTN, 6 = Telecel).
pub const DATA_BUNDLES: &[BundlePlan] = &[
    plan(1, "AT_BT_01", "50 MB NO EXPIRY", 100),
    plan(1, "AT_BT_02", "110 MB NO EXPIRY", 200),
    plan(1, "AT_BT_03", "385 MB NO EXPIRY", 300),
    plan(1, "AT_BT_04", "550 MB NO EXPIRY", 500),
    plan(1, "AT_BT_05", "880 MB NO EXPIRY", 1000),
    plan(1, "AT_BT_06", "1.7 GB NO EXPIRY", 2000),
    plan(1, "AT_BT_07", "4.4 GB NO EXPIRY", 5000),
    plan(1, "AT_BT_08", "9.9 GB NO EXPIRY", 10000),
    plan(1, "AT_FS_01", "Fusion 25Mins + 40MB", 200),
    plan(1, "AT_FS_02", "Fusion 65Mins + 120MB", 500),
    plan(1, "AT_SK_01", "440 MB 1 DAY", 300),
    plan(1, "AT_SK_02", "770 MB 3 DAYS", 500),
    plan(4, "MTN_BT_01", "92.41 MB", 100),
    plan(4, "MTN_BT_02", "461.42 MB", 500),
    plan(4, "MTN_BT_03", "923.24 MB", 1000),
    plan(4, "MTN_BT_04", "1.92 GB", 2000),
    plan(4, "MTN_BT_05", "4.80 GB", 5000),
    plan(4, "MTN_BT_06", "9.62 GB", 10000),
    plan(6, "VT_BT_01", "100 MB 1 DAY", 100),
    plan(6, "VT_BT_02", "350 MB 3 DAYS", 300),
    plan(6, "VT_BT_03", "1 GB 7 DAYS", 1000),
    plan(6, "VT_BT_04", "2.5 GB 30 DAYS", 2500),
    plan(6, "VT_BT_05", "5.5 GB 30 DAYS", 5000),
];

pub fn find_plan(network_id: i32, plan_id: &str) -> Option<&'static BundlePlan> {
    DATA_BUNDLES
        .iter()
        .find(|plan| plan.network_id == network_id && plan.plan_id == plan_id)
}

pub fn plans_for_network(network_id: i32) -> Vec<&'static BundlePlan> {
    DATA_BUNDLES
        .iter()
        .filter(|plan| plan.network_id == network_id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::str::FromStr;

    #[test]
    fn test_find_plan_matches_network_and_id() {
        let plan = find_plan(1, "AT_BT_05").unwrap();
        assert_eq!(plan.name, "880 MB NO EXPIRY");
        assert_eq!(plan.price(), BigDecimal::from_str("10.00").unwrap());
    }

    #[test]
    fn test_find_plan_rejects_wrong_network() {
        assert!(find_plan(4, "AT_BT_05").is_none());
        assert!(find_plan(1, "NOPE_01").is_none());
    }

    #[test]
    fn test_plan_ids_unique_within_network() {
        let keys: HashSet<(i32, &str)> = DATA_BUNDLES
            .iter()
            .map(|plan| (plan.network_id, plan.plan_id))
            .collect();
        assert_eq!(keys.len(), DATA_BUNDLES.len());
    }

    #[test]
    fn test_plans_for_network_filters() {
        let mtn = plans_for_network(4);
        assert!(!mtn.is_empty());
        assert!(mtn.iter().all(|plan| plan.network_id == 4));
    }
}
