//! End-to-end lifecycle tests driving the engine against the in-memory
//! store, the same way the service wires it up.

use std::sync::Arc;
use std::thread;

use chrono::NaiveDate;
use proptest::prelude::*;
use uuid::Uuid;

use campustrade_core::{ExchangeError, UserId};
use campustrade_items::{AllocationStatus, ListingKind};
use campustrade_notifications::InMemorySink;
use campustrade_orders::{MeetupDetails, OrderStatus};
use campustrade_ratings::{ExchangeKind, RatingKey};
use campustrade_rentals::RequestStatus;
use campustrade_store::{ExchangeStore, InMemoryStore};
use campustrade_swaps::OfferStatus;

use crate::conflict::{RENTAL_AUTO_DECLINE_COMMENT, SWAP_AUTO_REJECT_REASON};
use crate::engine::ExchangeEngine;
use crate::orders::CheckoutLine;
use crate::outbox::OutboxRelay;

fn engine() -> ExchangeEngine<Arc<InMemoryStore>> {
    ExchangeEngine::new(Arc::new(InMemoryStore::new()))
}

fn d(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

#[test]
fn accepting_a_rental_declines_overlapping_siblings() {
    let engine = engine();
    let owner = UserId::new();
    let alice = UserId::new();
    let bob = UserId::new();

    let bike = engine
        .list_item(owner, "Mountain bike", ListingKind::Rental, None)
        .unwrap();
    let a = engine
        .request_rental(bike.id, alice, d("2024-06-01"), d("2024-06-05"), None)
        .unwrap();
    let b = engine
        .request_rental(bike.id, bob, d("2024-06-03"), d("2024-06-10"), None)
        .unwrap();

    let update = engine
        .update_rental_status(a.id, RequestStatus::Accepted, owner, None)
        .unwrap();

    assert_eq!(update.request.status, RequestStatus::Accepted);
    assert_eq!(update.auto_declined, vec![b.id]);
    assert_eq!(
        engine.item(bike.id).unwrap().status,
        AllocationStatus::Rented
    );

    let bobs = engine.rental_requests_for_user(bob).unwrap();
    assert_eq!(bobs[0].status, RequestStatus::Declined);
    assert_eq!(
        bobs[0].comment.as_deref(),
        Some(RENTAL_AUTO_DECLINE_COMMENT)
    );
}

#[test]
fn non_overlapping_sibling_survives_an_accept() {
    let engine = engine();
    let owner = UserId::new();
    let bike = engine
        .list_item(owner, "Mountain bike", ListingKind::Rental, None)
        .unwrap();
    let a = engine
        .request_rental(bike.id, UserId::new(), d("2024-06-01"), d("2024-06-05"), None)
        .unwrap();
    let later = engine
        .request_rental(bike.id, UserId::new(), d("2024-06-06"), d("2024-06-10"), None)
        .unwrap();

    let update = engine
        .update_rental_status(a.id, RequestStatus::Accepted, owner, None)
        .unwrap();

    assert!(update.auto_declined.is_empty());
    let store = engine.store();
    let survivor = store
        .in_txn(|txn| txn.rental_request(later.id))
        .unwrap();
    assert_eq!(survivor.status, RequestStatus::Pending);
}

#[test]
fn terminal_requests_reject_further_updates() {
    let engine = engine();
    let owner = UserId::new();
    let renter = UserId::new();
    let bike = engine
        .list_item(owner, "Mountain bike", ListingKind::Rental, None)
        .unwrap();
    let req = engine
        .request_rental(bike.id, renter, d("2024-06-01"), d("2024-06-05"), None)
        .unwrap();

    engine
        .update_rental_status(req.id, RequestStatus::Accepted, owner, None)
        .unwrap();
    engine
        .update_rental_status(req.id, RequestStatus::Completed, owner, None)
        .unwrap();

    // A second completion hits the terminal state.
    let err = engine
        .update_rental_status(req.id, RequestStatus::Completed, owner, None)
        .unwrap_err();
    assert!(matches!(err, ExchangeError::InvalidTransition(_)));

    // And the item stayed where completion left it.
    assert_eq!(
        engine.item(bike.id).unwrap().status,
        AllocationStatus::Available
    );
}

#[test]
fn only_the_owner_accepts_and_requesters_cannot_rent_their_own_item() {
    let engine = engine();
    let owner = UserId::new();
    let renter = UserId::new();
    let bike = engine
        .list_item(owner, "Mountain bike", ListingKind::Rental, None)
        .unwrap();

    let err = engine
        .request_rental(bike.id, owner, d("2024-06-01"), d("2024-06-02"), None)
        .unwrap_err();
    assert!(matches!(err, ExchangeError::Validation(_)));

    let req = engine
        .request_rental(bike.id, renter, d("2024-06-01"), d("2024-06-02"), None)
        .unwrap();
    let err = engine
        .update_rental_status(req.id, RequestStatus::Accepted, renter, None)
        .unwrap_err();
    assert!(matches!(err, ExchangeError::Forbidden(_)));
}

#[test]
fn cancelling_an_accepted_rental_releases_the_item() {
    let engine = engine();
    let owner = UserId::new();
    let renter = UserId::new();
    let bike = engine
        .list_item(owner, "Mountain bike", ListingKind::Rental, None)
        .unwrap();
    let req = engine
        .request_rental(bike.id, renter, d("2024-06-01"), d("2024-06-05"), None)
        .unwrap();

    engine
        .update_rental_status(req.id, RequestStatus::Accepted, owner, None)
        .unwrap();
    assert_eq!(engine.item(bike.id).unwrap().status, AllocationStatus::Rented);

    engine
        .update_rental_status(req.id, RequestStatus::Cancelled, renter, None)
        .unwrap();
    assert_eq!(
        engine.item(bike.id).unwrap().status,
        AllocationStatus::Available
    );
}

#[test]
fn checkout_cancel_recheckout_round_trip() {
    let engine = engine();
    let seller = UserId::new();
    let buyer = UserId::new();
    let other_buyer = UserId::new();

    let lamp = engine
        .list_item(seller, "Desk lamp", ListingKind::Sale, Some(1500))
        .unwrap();

    let order = engine
        .checkout(
            buyer,
            vec![CheckoutLine {
                item_id: lamp.id,
                quantity: 1,
            }],
            MeetupDetails::default(),
        )
        .unwrap();
    assert_eq!(order.total(), 1500);
    assert_eq!(
        engine.item(lamp.id).unwrap().status,
        AllocationStatus::ReservedForSale
    );

    let cancellation = engine.cancel_order(order.id, buyer, None).unwrap();
    assert_eq!(cancellation.order.status, OrderStatus::Cancelled);
    assert_eq!(cancellation.released_items, vec![lamp.id]);
    assert_eq!(
        engine.item(lamp.id).unwrap().status,
        AllocationStatus::Available
    );

    // The released item is immediately purchasable again.
    engine
        .checkout(
            other_buyer,
            vec![CheckoutLine {
                item_id: lamp.id,
                quantity: 1,
            }],
            MeetupDetails::default(),
        )
        .unwrap();
}

#[test]
fn multi_line_checkout_is_all_or_nothing() {
    let engine = engine();
    let seller = UserId::new();
    let first_buyer = UserId::new();
    let second_buyer = UserId::new();

    let lamp = engine
        .list_item(seller, "Desk lamp", ListingKind::Sale, Some(1500))
        .unwrap();
    let chair = engine
        .list_item(seller, "Office chair", ListingKind::Sale, Some(4000))
        .unwrap();

    // The lamp gets reserved by someone else first.
    engine
        .checkout(
            first_buyer,
            vec![CheckoutLine {
                item_id: lamp.id,
                quantity: 1,
            }],
            MeetupDetails::default(),
        )
        .unwrap();

    let err = engine
        .checkout(
            second_buyer,
            vec![
                CheckoutLine {
                    item_id: chair.id,
                    quantity: 1,
                },
                CheckoutLine {
                    item_id: lamp.id,
                    quantity: 1,
                },
            ],
            MeetupDetails::default(),
        )
        .unwrap_err();

    match err {
        ExchangeError::ItemUnavailable(msg) => {
            assert!(msg.contains(&lamp.id.to_string()))
        }
        other => panic!("expected ItemUnavailable, got {other:?}"),
    }

    // No partial effects: the chair is untouched, the first reservation holds,
    // and no order exists for the failed buyer.
    assert_eq!(
        engine.item(chair.id).unwrap().status,
        AllocationStatus::Available
    );
    assert_eq!(
        engine.item(lamp.id).unwrap().status,
        AllocationStatus::ReservedForSale
    );
    assert!(engine.orders_for_user(second_buyer).unwrap().is_empty());
}

#[test]
fn completing_an_order_archives_items_and_gates_ratings_per_seller() {
    let engine = engine();
    let seller_a = UserId::new();
    let seller_b = UserId::new();
    let buyer = UserId::new();

    let lamp = engine
        .list_item(seller_a, "Desk lamp", ListingKind::Sale, Some(1500))
        .unwrap();
    let chair = engine
        .list_item(seller_b, "Office chair", ListingKind::Sale, Some(4000))
        .unwrap();

    let order = engine
        .checkout(
            buyer,
            vec![
                CheckoutLine {
                    item_id: lamp.id,
                    quantity: 1,
                },
                CheckoutLine {
                    item_id: chair.id,
                    quantity: 1,
                },
            ],
            MeetupDetails::default(),
        )
        .unwrap();

    let completion = engine.complete_order(order.id, buyer).unwrap();
    assert_eq!(completion.order.status, OrderStatus::Completed);
    assert_eq!(
        engine.item(lamp.id).unwrap().status,
        AllocationStatus::Archived
    );

    // One hint per distinct seller, all rateable.
    assert_eq!(completion.ratings.len(), 2);
    assert!(completion.ratings.iter().all(|h| h.should_rate));
    let counterparts: Vec<_> = completion
        .ratings
        .iter()
        .map(|h| h.key.counterpart_id)
        .collect();
    assert!(counterparts.contains(&seller_a));
    assert!(counterparts.contains(&seller_b));

    // Rating one seller closes that gate only.
    let key = completion.ratings[0].key;
    engine.submit_rating(key, 5, None).unwrap();
    assert!(!engine.should_rate(key).unwrap());
    assert!(engine.should_rate(completion.ratings[1].key).unwrap());
}

#[test]
fn checkout_prunes_the_buyers_cart() {
    let engine = engine();
    let seller = UserId::new();
    let buyer = UserId::new();

    let lamp = engine
        .list_item(seller, "Desk lamp", ListingKind::Sale, Some(1500))
        .unwrap();
    let chair = engine
        .list_item(seller, "Office chair", ListingKind::Sale, Some(4000))
        .unwrap();
    engine.add_to_cart(buyer, lamp.id, 1).unwrap();
    engine.add_to_cart(buyer, chair.id, 1).unwrap();

    engine
        .checkout(
            buyer,
            vec![CheckoutLine {
                item_id: lamp.id,
                quantity: 1,
            }],
            MeetupDetails::default(),
        )
        .unwrap();

    // Only the purchased item leaves the cart.
    assert_eq!(engine.cart_for_user(buyer).unwrap(), vec![(chair.id, 1)]);
}

#[test]
fn accepting_a_swap_claims_both_items_and_rejects_siblings() {
    let engine = engine();
    let owner = UserId::new();
    let alice = UserId::new();
    let bob = UserId::new();

    let guitar = engine
        .list_item(owner, "Acoustic guitar", ListingKind::Swap, None)
        .unwrap();
    let keyboard = engine
        .list_item(alice, "MIDI keyboard", ListingKind::Swap, None)
        .unwrap();

    let winning = engine
        .offer_swap(guitar.id, alice, Some(keyboard.id), None)
        .unwrap();
    let losing = engine.offer_swap(guitar.id, bob, None, None).unwrap();

    let update = engine
        .update_swap_status(winning.id, OfferStatus::Accepted, owner, None)
        .unwrap();

    assert_eq!(update.auto_rejected, vec![losing.id]);
    assert_eq!(
        engine.item(guitar.id).unwrap().status,
        AllocationStatus::Swapped
    );
    assert_eq!(
        engine.item(keyboard.id).unwrap().status,
        AllocationStatus::Swapped
    );

    let bobs = engine.swap_offers_for_user(bob).unwrap();
    assert_eq!(bobs[0].status, OfferStatus::Rejected);
    assert_eq!(
        bobs[0].rejection_reason.as_deref(),
        Some(SWAP_AUTO_REJECT_REASON)
    );
}

#[test]
fn completed_swap_unlocks_ratings_both_ways() {
    let engine = engine();
    let owner = UserId::new();
    let alice = UserId::new();

    let guitar = engine
        .list_item(owner, "Acoustic guitar", ListingKind::Swap, None)
        .unwrap();
    let offer = engine.offer_swap(guitar.id, alice, None, None).unwrap();

    engine
        .update_swap_status(offer.id, OfferStatus::Accepted, owner, None)
        .unwrap();
    let update = engine
        .update_swap_status(offer.id, OfferStatus::Completed, owner, None)
        .unwrap();

    assert_eq!(update.ratings.len(), 2);
    assert!(update.ratings.iter().all(|h| h.should_rate));

    // Terminal: a repeated completion is refused.
    let err = engine
        .update_swap_status(offer.id, OfferStatus::Completed, owner, None)
        .unwrap_err();
    assert!(matches!(err, ExchangeError::InvalidTransition(_)));
}

#[test]
fn racing_accepts_on_overlapping_requests_produce_one_winner() {
    let engine = Arc::new(engine());
    let owner = UserId::new();

    let bike = engine
        .list_item(owner, "Mountain bike", ListingKind::Rental, None)
        .unwrap();
    let a = engine
        .request_rental(bike.id, UserId::new(), d("2024-06-01"), d("2024-06-05"), None)
        .unwrap();
    let b = engine
        .request_rental(bike.id, UserId::new(), d("2024-06-03"), d("2024-06-10"), None)
        .unwrap();

    let handles: Vec<_> = [a.id, b.id]
        .into_iter()
        .map(|id| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || engine.update_rental_status(id, RequestStatus::Accepted, owner, None))
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    // Exactly one accept commits; the other observes either the declined
    // terminal state (sibling sweep got there first) or the lost item claim.
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert!(matches!(
        loser,
        ExchangeError::InvalidTransition(_) | ExchangeError::Conflict(_)
    ));

    // The item ends in exactly one allocation state, claimed by one request.
    assert_eq!(engine.item(bike.id).unwrap().status, AllocationStatus::Rented);
    let statuses: Vec<_> = engine
        .store()
        .in_txn(|txn| {
            Ok(vec![
                txn.rental_request(a.id)?.status,
                txn.rental_request(b.id)?.status,
            ])
        })
        .unwrap();
    assert_eq!(
        statuses
            .iter()
            .filter(|s| **s == RequestStatus::Accepted)
            .count(),
        1
    );
    assert!(!statuses.contains(&RequestStatus::Pending));
}

#[test]
fn racing_checkouts_of_one_item_never_oversell() {
    let engine = Arc::new(engine());
    let seller = UserId::new();
    let lamp = engine
        .list_item(seller, "Desk lamp", ListingKind::Sale, Some(1500))
        .unwrap();
    let buyers = [UserId::new(), UserId::new()];

    let handles: Vec<_> = buyers
        .into_iter()
        .map(|buyer| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                engine.checkout(
                    buyer,
                    vec![CheckoutLine {
                        item_id: lamp.id,
                        quantity: 1,
                    }],
                    MeetupDetails::default(),
                )
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert!(matches!(
        loser,
        ExchangeError::ItemUnavailable(_) | ExchangeError::Conflict(_)
    ));
    assert_eq!(
        engine.item(lamp.id).unwrap().status,
        AllocationStatus::ReservedForSale
    );
}

#[test]
fn concurrent_rating_submissions_insert_exactly_one_row() {
    let engine = Arc::new(engine());
    let owner = UserId::new();
    let renter = UserId::new();

    let bike = engine
        .list_item(owner, "Mountain bike", ListingKind::Rental, None)
        .unwrap();
    let req = engine
        .request_rental(bike.id, renter, d("2024-06-01"), d("2024-06-05"), None)
        .unwrap();
    engine
        .update_rental_status(req.id, RequestStatus::Accepted, owner, None)
        .unwrap();
    engine
        .update_rental_status(req.id, RequestStatus::Completed, owner, None)
        .unwrap();

    let key = RatingKey {
        rater_id: renter,
        counterpart_id: owner,
        kind: ExchangeKind::Rental,
        exchange_id: Uuid::from(req.id),
    };

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || engine.submit_rating(key, 5, None))
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(ExchangeError::DuplicateRating))));
    assert!(!engine.should_rate(key).unwrap());
}

#[test]
fn ratings_require_a_completed_exchange_between_the_parties() {
    let engine = engine();
    let owner = UserId::new();
    let renter = UserId::new();
    let stranger = UserId::new();

    let bike = engine
        .list_item(owner, "Mountain bike", ListingKind::Rental, None)
        .unwrap();
    let req = engine
        .request_rental(bike.id, renter, d("2024-06-01"), d("2024-06-05"), None)
        .unwrap();

    let key = RatingKey {
        rater_id: renter,
        counterpart_id: owner,
        kind: ExchangeKind::Rental,
        exchange_id: Uuid::from(req.id),
    };

    // Not completed yet.
    let err = engine.submit_rating(key, 5, None).unwrap_err();
    assert!(matches!(err, ExchangeError::Validation(_)));

    engine
        .update_rental_status(req.id, RequestStatus::Accepted, owner, None)
        .unwrap();
    engine
        .update_rental_status(req.id, RequestStatus::Completed, owner, None)
        .unwrap();

    // A third party cannot rate.
    let outsider = RatingKey {
        rater_id: stranger,
        ..key
    };
    let err = engine.submit_rating(outsider, 5, None).unwrap_err();
    assert!(matches!(err, ExchangeError::Forbidden(_)));

    engine.submit_rating(key, 4, None).unwrap();
    assert_eq!(engine.ratings_about(owner).unwrap().len(), 1);
}

#[test]
fn archiving_an_item_sweeps_pending_requests_and_offers() {
    let engine = engine();
    let owner = UserId::new();
    let renter = UserId::new();

    let bike = engine
        .list_item(owner, "Mountain bike", ListingKind::Rental, None)
        .unwrap();
    let req = engine
        .request_rental(bike.id, renter, d("2024-06-01"), d("2024-06-05"), None)
        .unwrap();

    let err = engine.archive_item(bike.id, renter).unwrap_err();
    assert!(matches!(err, ExchangeError::Forbidden(_)));

    let archival = engine.archive_item(bike.id, owner).unwrap();
    assert_eq!(archival.item.status, AllocationStatus::Archived);
    assert_eq!(archival.declined_requests, vec![req.id]);

    // An archived item takes no new requests.
    let err = engine
        .request_rental(bike.id, renter, d("2024-07-01"), d("2024-07-02"), None)
        .unwrap_err();
    assert!(matches!(err, ExchangeError::Validation(_)));
}

#[test]
fn committed_operations_reach_the_sink_through_the_relay() {
    let store = Arc::new(InMemoryStore::new());
    let sink = Arc::new(InMemorySink::new());
    let engine = ExchangeEngine::new(Arc::clone(&store));
    let relay = OutboxRelay::new(Arc::clone(&store), Arc::clone(&sink));

    let owner = UserId::new();
    let renter = UserId::new();
    let bike = engine
        .list_item(owner, "Mountain bike", ListingKind::Rental, None)
        .unwrap();
    engine
        .request_rental(bike.id, renter, d("2024-06-01"), d("2024-06-05"), None)
        .unwrap();

    assert_eq!(relay.drain(), 1);
    let delivered = sink.delivered();
    assert_eq!(delivered[0].recipient_id, owner);

    // The durable rows remain readable after delivery.
    let inbox = engine.notifications_for_user(owner).unwrap();
    assert_eq!(inbox.len(), 1);
    assert!(!inbox[0].is_read);

    let read = engine
        .mark_notification_read(inbox[0].id, owner)
        .unwrap();
    assert!(read.is_read);
    let err = engine
        .mark_notification_read(inbox[0].id, renter)
        .unwrap_err();
    assert!(matches!(err, ExchangeError::Forbidden(_)));
}

proptest! {
    // Accepting one request declines exactly the pending siblings whose
    // window intersects it, whatever the window layout.
    #[test]
    fn accept_declines_exactly_the_overlapping_siblings(
        accepted in (0u64..30, 0u64..10),
        siblings in proptest::collection::vec((0u64..30, 0u64..10), 1..6),
    ) {
        let engine = engine();
        let owner = UserId::new();
        let base = d("2024-06-01");
        let window = |offset: u64, len: u64| {
            let start = base + chrono::Days::new(offset);
            (start, start + chrono::Days::new(len))
        };

        let bike = engine
            .list_item(owner, "Mountain bike", ListingKind::Rental, None)
            .unwrap();
        let (start, end) = window(accepted.0, accepted.1);
        let winner = engine
            .request_rental(bike.id, UserId::new(), start, end, None)
            .unwrap();

        let mut expected_declined = Vec::new();
        let mut expected_survivors = Vec::new();
        for (offset, len) in siblings {
            let (s, e) = window(offset, len);
            let req = engine
                .request_rental(bike.id, UserId::new(), s, e, None)
                .unwrap();
            if s <= end && start <= e {
                expected_declined.push(req.id);
            } else {
                expected_survivors.push(req.id);
            }
        }

        let mut update = engine
            .update_rental_status(winner.id, RequestStatus::Accepted, owner, None)
            .unwrap();
        update.auto_declined.sort();
        expected_declined.sort();
        prop_assert_eq!(update.auto_declined, expected_declined);

        for id in expected_survivors {
            let req = engine.store().in_txn(|txn| txn.rental_request(id)).unwrap();
            prop_assert_eq!(req.status, RequestStatus::Pending);
        }
    }
}
