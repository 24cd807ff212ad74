//! Rating Gate: post-exchange rating submission and the should-rate check.
//!
//! Submission re-verifies the underlying exchange inside the transaction;
//! the store's uniqueness constraint on `RatingKey` decides races, so two
//! concurrent submissions for the same key yield exactly one row.

use chrono::Utc;

use campustrade_core::{ExchangeError, ExchangeResult, UserId};
use campustrade_notifications::{Notification, NotificationKind};
use campustrade_orders::OrderStatus;
use campustrade_ratings::{ExchangeKind, Rating, RatingKey};
use campustrade_rentals::RequestStatus;
use campustrade_store::{ExchangeStore, Txn};
use campustrade_swaps::OfferStatus;

use crate::engine::ExchangeEngine;

impl<S: ExchangeStore> ExchangeEngine<S> {
    /// Submit a rating for a completed exchange. The exchange named by
    /// `key` must exist, be completed, and list the rater and counterpart
    /// as its parties. A second submission for the same key fails with
    /// `DuplicateRating` no matter how the calls interleave.
    pub fn submit_rating(
        &self,
        key: RatingKey,
        score: u8,
        text: Option<String>,
    ) -> ExchangeResult<Rating> {
        let now = Utc::now();
        let rating = self.store().in_txn(|txn| {
            verify_exchange(txn, &key)?;
            let rating = Rating::new(key, score, text.clone(), now)?;
            txn.insert_rating(rating.clone())?;
            txn.queue_notification(Notification::new(
                key.counterpart_id,
                Some(key.rater_id),
                NotificationKind::Rating,
                format!("You received a {score}-star rating"),
                Some(format!("/users/{}/ratings", key.counterpart_id)),
                now,
            ));
            Ok(rating)
        })?;

        tracing::info!(
            rater = %key.rater_id,
            counterpart = %key.counterpart_id,
            kind = %key.kind,
            score,
            "rating submitted"
        );
        Ok(rating)
    }

    /// Whether the prompt to rate should still be shown: true until a
    /// rating row exists for this key.
    pub fn should_rate(&self, key: RatingKey) -> ExchangeResult<bool> {
        self.store().in_txn(|txn| Ok(!txn.has_rating(&key)))
    }

    /// Ratings received by a user, oldest first.
    pub fn ratings_about(&self, user: UserId) -> ExchangeResult<Vec<Rating>> {
        self.store().in_txn(|txn| Ok(txn.ratings_about(user)))
    }
}

/// The rating must point at a real, completed exchange between the two
/// named parties. For sales only the buyer rates (one rating per distinct
/// seller); rentals and swaps are rated in both directions.
fn verify_exchange(txn: &Txn<'_>, key: &RatingKey) -> ExchangeResult<()> {
    match key.kind {
        ExchangeKind::Rental => {
            let request = txn.rental_request(key.exchange_id.into())?;
            if request.status != RequestStatus::Completed {
                return Err(ExchangeError::validation("rental is not completed"));
            }
            let parties = [
                (request.owner_id, request.requester_id),
                (request.requester_id, request.owner_id),
            ];
            if !parties.contains(&(key.rater_id, key.counterpart_id)) {
                return Err(ExchangeError::forbidden("not a party to this rental"));
            }
        }
        ExchangeKind::Swap => {
            let offer = txn.swap_offer(key.exchange_id.into())?;
            if offer.status != OfferStatus::Completed {
                return Err(ExchangeError::validation("swap is not completed"));
            }
            let parties = [
                (offer.owner_id, offer.requester_id),
                (offer.requester_id, offer.owner_id),
            ];
            if !parties.contains(&(key.rater_id, key.counterpart_id)) {
                return Err(ExchangeError::forbidden("not a party to this swap"));
            }
        }
        ExchangeKind::Sale => {
            let order = txn.order(key.exchange_id.into())?;
            if order.status != OrderStatus::Completed {
                return Err(ExchangeError::validation("order is not completed"));
            }
            let rater_is_buyer = order.buyer_id == key.rater_id;
            let counterpart_sold = order
                .distinct_sellers()
                .contains(&key.counterpart_id);
            if !(rater_is_buyer && counterpart_sold) {
                return Err(ExchangeError::forbidden(
                    "only the buyer may rate a seller of this order",
                ));
            }
        }
    }
    Ok(())
}
