//! Diesel table definitions, kept in step with `migrations/`.

diesel::table! {
    orders (id) {
        id -> Text,
        user_id -> Text,
        market_id -> Text,
        outcome_id -> Text,
        side -> Text,
        order_type -> Text,
        limit_price -> Nullable<Text>,
        requested -> Text,
        filled -> Text,
        status -> Text,
        created_at -> Text,
        sequence -> BigInt,
    }
}

diesel::table! {
    fills (id) {
        id -> Text,
        order_id -> Text,
        user_id -> Text,
        maker_order_id -> Nullable<Text>,
        market_id -> Text,
        outcome_id -> Text,
        side -> Text,
        source -> Text,
        price -> Text,
        amount -> Text,
        shares -> Text,
        sequence -> BigInt,
        created_at -> Text,
    }
}

diesel::table! {
    hedge_orders (id) {
        id -> Text,
        fill_id -> Text,
        order_id -> Text,
        market_id -> Text,
        outcome_id -> Text,
        instrument_id -> Text,
        side -> Text,
        price -> Text,
        amount -> Text,
        size -> Text,
        status -> Text,
        external_order_id -> Nullable<Text>,
        filled_size -> Text,
        reason -> Nullable<Text>,
        attempts -> Integer,
        created_at -> Text,
        updated_at -> Text,
        last_attempt_at -> Nullable<Text>,
    }
}

diesel::table! {
    risk_snapshots (id) {
        id -> Text,
        total_unhedged -> Text,
        total_hedged -> Text,
        open_positions -> BigInt,
        recent_failures -> BigInt,
        failure_rate -> Double,
        created_at -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(orders, fills, hedge_orders, risk_snapshots);
