use rust_decimal::Decimal;
use uuid::Uuid;

use crate::clock::Clock;
use crate::db::Store;
use crate::errors::AppError;
use crate::models::follow::FollowParams;
use crate::models::Follow;

fn validate(params: &FollowParams) -> Result<(), AppError> {
    if matches!(params.multiplier, Some(m) if m < Decimal::ZERO) {
        return Err(AppError::Validation("multiplier must not be negative".into()));
    }
    if matches!(params.max_size, Some(m) if m <= Decimal::ZERO) {
        return Err(AppError::Validation("maxSize must be positive".into()));
    }
    if matches!(params.risk_pct, Some(r) if r <= Decimal::ZERO || r > Decimal::ONE) {
        return Err(AppError::Validation("riskPct must be in (0, 1]".into()));
    }
    Ok(())
}

/// Follow a trader, or update the existing follow for the pair.
pub async fn follow_trader<S: Store + ?Sized>(
    store: &S,
    clock: &dyn Clock,
    default_multiplier: Decimal,
    follower_id: Uuid,
    trader_id: Uuid,
    params: &FollowParams,
) -> Result<Follow, AppError> {
    if follower_id == trader_id {
        return Err(AppError::Validation("cannot follow yourself".into()));
    }
    validate(params)?;

    if store.find_trader(trader_id).await?.is_none() {
        return Err(AppError::NotFound(format!("trader {trader_id}")));
    }

    let now = clock.now();
    let follow = match store.find_follow(follower_id, trader_id).await? {
        Some(existing) => apply(existing, params, now),
        None => Follow {
            id: Uuid::new_v4(),
            follower_id,
            trader_id,
            multiplier: params.multiplier.unwrap_or(default_multiplier),
            auto_copy: params.auto_copy.unwrap_or(false),
            max_size: params.max_size,
            risk_pct: params.risk_pct,
            created_at: now,
            updated_at: now,
        },
    };

    let saved = store.save_follow(&follow).await?;
    tracing::info!(
        follower_id = %follower_id,
        trader_id = %trader_id,
        multiplier = %saved.multiplier,
        auto_copy = saved.auto_copy,
        "Follow saved"
    );
    Ok(saved)
}

/// Change the parameters of an existing follow.
pub async fn update_follow<S: Store + ?Sized>(
    store: &S,
    clock: &dyn Clock,
    follower_id: Uuid,
    trader_id: Uuid,
    params: &FollowParams,
) -> Result<Follow, AppError> {
    validate(params)?;

    let existing = store
        .find_follow(follower_id, trader_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("follow of trader {trader_id}")))?;

    let saved = store.save_follow(&apply(existing, params, clock.now())).await?;
    Ok(saved)
}

pub async fn unfollow<S: Store + ?Sized>(
    store: &S,
    follower_id: Uuid,
    trader_id: Uuid,
) -> Result<(), AppError> {
    if !store.delete_follow(follower_id, trader_id).await? {
        return Err(AppError::NotFound(format!("follow of trader {trader_id}")));
    }
    tracing::info!(follower_id = %follower_id, trader_id = %trader_id, "Unfollowed");
    Ok(())
}

fn apply(mut follow: Follow, params: &FollowParams, now: chrono::DateTime<chrono::Utc>) -> Follow {
    if let Some(m) = params.multiplier {
        follow.multiplier = m;
    }
    if let Some(a) = params.auto_copy {
        follow.auto_copy = a;
    }
    if params.max_size.is_some() {
        follow.max_size = params.max_size;
    }
    if params.risk_pct.is_some() {
        follow.risk_pct = params.risk_pct;
    }
    follow.updated_at = now;
    follow
}
