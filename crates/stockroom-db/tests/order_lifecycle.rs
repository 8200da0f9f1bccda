//! End-to-end order lifecycle against an in-memory database.

use chrono::{Duration, Utc};
use stockroom_core::analytics::DateRange;
use stockroom_core::order::{NewOrder, OrderLineRequest};
use stockroom_core::{CoreError, ItemInput, OrderStatus, StoreSettings};
use stockroom_db::{CreateBill, Database, DbConfig, DbError};

async fn db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

async fn item(db: &Database, name: &str, price_cents: i64, quantity: i64) -> String {
    db.items()
        .create(&ItemInput {
            name: name.to_string(),
            price_cents,
            quantity,
            weight_grams: None,
            in_stock: None,
        })
        .await
        .unwrap()
        .id
}

fn order(lines: &[(&str, i64)]) -> NewOrder {
    NewOrder {
        customer_name: "Ana".to_string(),
        items: lines
            .iter()
            .map(|(id, qty)| OrderLineRequest {
                item_id: id.to_string(),
                quantity: *qty,
                unit_price_cents: None,
            })
            .collect(),
    }
}

async fn stock(db: &Database, id: &str) -> i64 {
    db.items().get(id).await.unwrap().quantity
}

async fn set_tax(db: &Database, bps: u32) {
    db.settings()
        .update(&StoreSettings {
            tax_rate_bps: bps,
            ..StoreSettings::default()
        })
        .await
        .unwrap();
}

fn domain(err: DbError) -> CoreError {
    match err {
        DbError::Domain(e) => e,
        other => panic!("expected domain error, got {other:?}"),
    }
}

#[tokio::test]
async fn create_order_reserves_stock_and_snapshots_lines() {
    let db = db().await;
    let widget = item(&db, "Widget", 100, 10).await;

    let created = db.order_engine().create_order(&order(&[(&widget, 3)])).await.unwrap();

    assert_eq!(created.status, OrderStatus::Pending);
    assert_eq!(created.items.len(), 1);
    assert_eq!(created.items[0].name_snapshot, "Widget");
    assert_eq!(created.items[0].unit_price_cents, 100);
    assert!(created.bill.is_none());
    assert_eq!(stock(&db, &widget).await, 7);

    // Later catalog edits do not touch the captured line.
    db.items()
        .update(
            &widget,
            &ItemInput {
                name: "Widget v2".into(),
                price_cents: 250,
                quantity: 7,
                weight_grams: None,
                in_stock: None,
            },
        )
        .await
        .unwrap();
    let loaded = db.order_engine().get_order(&created.id).await.unwrap();
    assert_eq!(loaded.items[0].name_snapshot, "Widget");
    assert_eq!(loaded.items[0].unit_price_cents, 100);
}

#[tokio::test]
async fn completing_issues_one_bill_with_settings_tax() {
    let db = db().await;
    let widget = item(&db, "Widget", 100, 10).await;
    set_tax(&db, 825).await;

    let created = db.order_engine().create_order(&order(&[(&widget, 3)])).await.unwrap();
    let completed = db
        .order_engine()
        .update_status(&created.id, "completed", None)
        .await
        .unwrap();

    assert_eq!(completed.status, OrderStatus::Completed);
    let bill = completed.bill.expect("bill written on completion");
    assert_eq!(bill.total_cents, 300);
    assert_eq!(bill.tax_cents, 25);
    assert_eq!(bill.tax_rate_bps, 825);
    assert_eq!(bill.payment_method, "cash");
    assert_eq!(stock(&db, &widget).await, 7);

    let err = db
        .order_engine()
        .update_status(&created.id, "COMPLETED", None)
        .await
        .unwrap_err();
    assert!(matches!(domain(err), CoreError::InvalidTransition { .. }));

    let err = db
        .billing()
        .create_bill(&CreateBill {
            order_id: created.id.clone(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(domain(err), CoreError::DuplicateBill { .. }));

    // A rate change after billing leaves the bill alone.
    set_tax(&db, 1000).await;
    let same = db.bills().get(&bill.id).await.unwrap();
    assert_eq!(same.tax_cents, 25);
}

#[tokio::test]
async fn cancelling_restores_stock_once() {
    let db = db().await;
    let widget = item(&db, "Widget", 100, 10).await;

    let created = db.order_engine().create_order(&order(&[(&widget, 3)])).await.unwrap();
    assert_eq!(stock(&db, &widget).await, 7);

    let cancelled = db
        .order_engine()
        .update_status(&created.id, "Cancelled", None)
        .await
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert!(cancelled.bill.is_none());
    assert_eq!(stock(&db, &widget).await, 10);

    let err = db
        .order_engine()
        .update_status(&created.id, "cancelled", None)
        .await
        .unwrap_err();
    assert!(matches!(
        domain(err),
        CoreError::InvalidTransition {
            from: OrderStatus::Cancelled,
            to: OrderStatus::Cancelled,
            ..
        }
    ));
    assert_eq!(stock(&db, &widget).await, 10);

    let err = db
        .order_engine()
        .update_status(&created.id, "completed", None)
        .await
        .unwrap_err();
    assert!(matches!(domain(err), CoreError::InvalidTransition { .. }));
}

#[tokio::test]
async fn failed_create_moves_no_stock() {
    let db = db().await;
    let widget = item(&db, "Widget", 100, 10).await;

    let err = db
        .order_engine()
        .create_order(&order(&[(&widget, 2), ("missing", 1)]))
        .await
        .unwrap_err();
    assert!(matches!(domain(err), CoreError::ItemNotFound(id) if id == "missing"));
    assert_eq!(stock(&db, &widget).await, 10);
    assert_eq!(db.orders().count().await.unwrap(), 0);
}

#[tokio::test]
async fn repeated_lines_are_checked_against_combined_quantity() {
    let db = db().await;
    let widget = item(&db, "Widget", 100, 6).await;

    let err = db
        .order_engine()
        .create_order(&order(&[(&widget, 4), (&widget, 4)]))
        .await
        .unwrap_err();
    match domain(err) {
        CoreError::InsufficientStock {
            available, requested, ..
        } => {
            assert_eq!(available, 6);
            assert_eq!(requested, 8);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(stock(&db, &widget).await, 6);

    let ok = db
        .order_engine()
        .create_order(&order(&[(&widget, 4), (&widget, 2)]))
        .await
        .unwrap();
    assert_eq!(ok.items.len(), 2);
    assert_eq!(ok.items[1].position, 1);
    assert_eq!(stock(&db, &widget).await, 0);
    assert!(!db.items().get(&widget).await.unwrap().in_stock);
}

#[tokio::test]
async fn deleting_an_order_keeps_stock_where_it_is() {
    let db = db().await;
    let widget = item(&db, "Widget", 100, 10).await;

    let created = db.order_engine().create_order(&order(&[(&widget, 3)])).await.unwrap();
    db.order_engine()
        .update_status(&created.id, "completed", None)
        .await
        .unwrap();

    db.order_engine().delete_order(&created.id).await.unwrap();
    assert_eq!(stock(&db, &widget).await, 7);
    assert!(db.bills().for_order(&created.id).await.unwrap().is_none());

    let err = db.order_engine().get_order(&created.id).await.unwrap_err();
    assert!(matches!(domain(err), CoreError::OrderNotFound(_)));

    let err = db.order_engine().delete_order(&created.id).await.unwrap_err();
    assert!(matches!(domain(err), CoreError::OrderNotFound(_)));
}

#[tokio::test]
async fn ordered_items_cannot_be_deleted() {
    let db = db().await;
    let widget = item(&db, "Widget", 100, 10).await;
    db.order_engine().create_order(&order(&[(&widget, 1)])).await.unwrap();

    let err = db.items().delete(&widget).await.unwrap_err();
    assert!(matches!(domain(err), CoreError::ItemInUse { .. }));
}

#[tokio::test]
async fn status_strings_are_checked() {
    let db = db().await;
    let widget = item(&db, "Widget", 100, 10).await;
    let created = db.order_engine().create_order(&order(&[(&widget, 1)])).await.unwrap();

    let err = db
        .order_engine()
        .update_status(&created.id, "shipped", None)
        .await
        .unwrap_err();
    assert!(matches!(domain(err), CoreError::InvalidStatus(_)));

    let err = db
        .order_engine()
        .update_status(&created.id, "pending", None)
        .await
        .unwrap_err();
    assert!(matches!(domain(err), CoreError::InvalidTransition { .. }));

    let err = db
        .order_engine()
        .update_status("missing", "completed", None)
        .await
        .unwrap_err();
    assert!(matches!(domain(err), CoreError::OrderNotFound(_)));
}

#[tokio::test]
async fn direct_bill_completes_a_pending_order() {
    let db = db().await;
    let widget = item(&db, "Widget", 100, 10).await;
    let created = db.order_engine().create_order(&order(&[(&widget, 2)])).await.unwrap();

    let bill = db
        .billing()
        .create_bill(&CreateBill {
            order_id: created.id.clone(),
            total_cents: None,
            tax_rate_bps: Some(1000),
            payment_method: Some("card".into()),
        })
        .await
        .unwrap();
    assert_eq!(bill.total_cents, 200);
    assert_eq!(bill.tax_cents, 20);
    assert_eq!(bill.payment_method, "card");

    let loaded = db.order_engine().get_order(&created.id).await.unwrap();
    assert_eq!(loaded.status, OrderStatus::Completed);
    assert_eq!(loaded.bill, Some(bill.clone()));

    let receipt = db.billing().receipt(&bill.id).await.unwrap();
    assert_eq!(&receipt[..2], &[0x1B, 0x40]);

    let cancelled = db.order_engine().create_order(&order(&[(&widget, 1)])).await.unwrap();
    db.order_engine()
        .update_status(&cancelled.id, "cancelled", None)
        .await
        .unwrap();
    let err = db
        .billing()
        .create_bill(&CreateBill {
            order_id: cancelled.id.clone(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(domain(err), CoreError::InvalidTransition { .. }));

    let err = db
        .billing()
        .create_bill(&CreateBill {
            order_id: "missing".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(domain(err), CoreError::OrderNotFound(_)));
}

#[tokio::test]
async fn analytics_on_an_idle_store_is_zero_filled() {
    let db = db().await;
    let range = DateRange::parse(Some("2024-03-01"), Some("2024-03-07")).unwrap();

    let days = db.analytics().daily_sales(&range).await.unwrap();
    assert_eq!(days.len(), 7);
    assert_eq!(days[0].date, "2024-03-01");
    assert!(days.iter().all(|d| d.order_count == 0 && d.total_sales.is_zero()));

    let metrics = db.analytics().metrics(&range).await.unwrap();
    assert_eq!(metrics.total_orders, 0);
    assert!(metrics.total_sales.is_zero());
    assert!(metrics.average_order_value.is_zero());
    assert!(metrics.top_selling_items.is_empty());
    assert_eq!(metrics.trends.orders, 0.0);
    assert_eq!(metrics.trends.sales, 0.0);

    let backwards = DateRange::parse(Some("2024-03-07"), Some("2024-03-01")).unwrap();
    assert!(db.analytics().daily_sales(&backwards).await.unwrap().is_empty());
}

#[tokio::test]
async fn analytics_skips_cancelled_orders() {
    let db = db().await;
    let widget = item(&db, "Widget", 100, 20).await;
    let gadget = item(&db, "Gadget", 500, 20).await;

    db.order_engine().create_order(&order(&[(&widget, 3)])).await.unwrap();
    let done = db
        .order_engine()
        .create_order(&order(&[(&gadget, 1), (&widget, 1)]))
        .await
        .unwrap();
    db.order_engine().update_status(&done.id, "completed", None).await.unwrap();
    let dropped = db.order_engine().create_order(&order(&[(&gadget, 5)])).await.unwrap();
    db.order_engine()
        .update_status(&dropped.id, "cancelled", None)
        .await
        .unwrap();

    let now = Utc::now();
    let range = DateRange::new(now - Duration::days(1), now + Duration::hours(1));
    let metrics = db.analytics().metrics(&range).await.unwrap();

    assert_eq!(metrics.total_orders, 2);
    assert_eq!(metrics.total_sales.cents(), 300 + 600);
    assert_eq!(metrics.average_order_value.cents(), 450);
    assert_eq!(metrics.top_selling_items[0].name, "Widget");
    assert_eq!(metrics.top_selling_items[0].quantity, 4);
    assert_eq!(metrics.trends.orders, 100.0);

    let daily = db.analytics().daily_sales(&range).await.unwrap();
    let orders: i64 = daily.iter().map(|d| d.order_count).sum();
    assert_eq!(orders, 2);
}

#[tokio::test]
async fn prices_beyond_the_cap_are_rejected_up_front() {
    let db = db().await;

    let err = db
        .items()
        .create(&ItemInput {
            name: "Gold bar".to_string(),
            price_cents: i64::MAX / 2 + 1,
            quantity: 10,
            weight_grams: None,
            in_stock: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(domain(err), CoreError::Validation(_)));
    assert_eq!(db.items().count().await.unwrap(), 0);

    let widget = item(&db, "Widget", 100, 10).await;
    let mut request = order(&[(&widget, 2)]);
    request.items[0].unit_price_cents = Some(i64::MAX / 2 + 1);
    let err = db.order_engine().create_order(&request).await.unwrap_err();
    assert!(matches!(domain(err), CoreError::Validation(_)));
    assert_eq!(stock(&db, &widget).await, 10);
}

#[tokio::test]
async fn most_expensive_item_still_completes() {
    let db = db().await;
    set_tax(&db, 10000).await;
    let gold = item(&db, "Gold bar", stockroom_core::MAX_PRICE_CENTS, 10).await;
    let engine = db.order_engine();

    let created = engine.create_order(&order(&[(&gold, 2)])).await.unwrap();
    let completed = engine.update_status(&created.id, "COMPLETED", None).await.unwrap();

    let bill = completed.bill.unwrap();
    assert_eq!(bill.total_cents, 2 * stockroom_core::MAX_PRICE_CENTS);
    assert_eq!(bill.tax_cents, 2 * stockroom_core::MAX_PRICE_CENTS);
    assert_eq!(bill.grand_total().cents(), 4 * stockroom_core::MAX_PRICE_CENTS);
}

#[tokio::test]
async fn direct_bill_total_beyond_the_cap_is_rejected() {
    let db = db().await;
    let widget = item(&db, "Widget", 100, 10).await;
    let created = db.order_engine().create_order(&order(&[(&widget, 1)])).await.unwrap();

    let err = db
        .billing()
        .create_bill(&CreateBill {
            order_id: created.id.clone(),
            total_cents: Some(i64::MAX),
            ..CreateBill::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(domain(err), CoreError::Validation(_)));

    // The failed bill rolled back the completion too.
    let order = db.order_engine().get_order(&created.id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert!(order.bill.is_none());
}

// =============================================================================
// Concurrent transitions (file-backed, so requests really overlap)
// =============================================================================

async fn file_db(dir: &tempfile::TempDir) -> Database {
    Database::new(DbConfig::new(dir.path().join("race.db")).max_connections(4))
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn racing_completions_issue_one_bill() {
    let dir = tempfile::tempdir().unwrap();
    let db = file_db(&dir).await;
    let widget = item(&db, "Widget", 100, 100).await;

    for _ in 0..10 {
        let created = db.order_engine().create_order(&order(&[(&widget, 1)])).await.unwrap();
        let (a, b) = (db.order_engine(), db.order_engine());

        let (first, second) = tokio::join!(
            a.update_status(&created.id, "COMPLETED", Some("cash")),
            b.update_status(&created.id, "COMPLETED", Some("card")),
        );

        let (ok, lost) = match (first, second) {
            (Ok(order), Err(err)) | (Err(err), Ok(order)) => (order, err),
            (first, second) => panic!("expected exactly one success, got {first:?} and {second:?}"),
        };
        assert_eq!(ok.status, OrderStatus::Completed);
        assert!(matches!(domain(lost), CoreError::InvalidTransition { .. }));

        let bills: Vec<_> = db
            .bills()
            .list(500)
            .await
            .unwrap()
            .into_iter()
            .filter(|bill| bill.order_id == created.id)
            .collect();
        assert_eq!(bills.len(), 1);
    }

    assert_eq!(stock(&db, &widget).await, 90);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn racing_cancellations_restore_stock_once() {
    let dir = tempfile::tempdir().unwrap();
    let db = file_db(&dir).await;
    let widget = item(&db, "Widget", 100, 10).await;

    for _ in 0..10 {
        let created = db.order_engine().create_order(&order(&[(&widget, 3)])).await.unwrap();
        assert_eq!(stock(&db, &widget).await, 7);
        let (a, b) = (db.order_engine(), db.order_engine());

        let (first, second) = tokio::join!(
            a.update_status(&created.id, "CANCELLED", None),
            b.update_status(&created.id, "CANCELLED", None),
        );

        assert_eq!(
            [first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count(),
            1
        );
        let lost = first.and(second).unwrap_err();
        assert!(matches!(domain(lost), CoreError::InvalidTransition { .. }));
        assert_eq!(stock(&db, &widget).await, 10);
    }
}
