//! End-to-end marketplace scenarios against a real Postgres database
//!
//! Run with `TEST_DATABASE_URL=postgres://... cargo test -- --ignored`.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use sqlx::PgPool;
    use uuid::Uuid;

    use lendbarter_server::db;
    use lendbarter_server::error::ApiError;
    use lendbarter_server::loan::{CreateLoanRequest, LoanService, LoanStatus, RecordPaymentRequest};
    use lendbarter_server::messaging::{MessageService, SendMessageRequest};
    use lendbarter_server::models::{Actor, PaginationParams, UpsertProfileRequest, UserRole};
    use lendbarter_server::offer::{CreateOfferRequest, OfferService, OfferStatus};
    use lendbarter_server::product_offer::{
        CreateCounterOfferRequest, CreateProductOfferRequest, ProductOfferService, ReviewStatus,
    };
    use lendbarter_server::profile::ProfileService;
    use lendbarter_server::repayment::{
        ProposalTerms, RepaymentMethod, RepaymentService, RepaymentStatus,
    };

    /// Helper to create a migrated test database pool
    async fn setup_test_db() -> PgPool {
        let database_url = std::env::var("TEST_DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/lendbarter_test".to_string());

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        db::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        pool
    }

    async fn member(pool: &PgPool, role: UserRole, name: &str) -> Actor {
        let id = Uuid::new_v4();
        ProfileService::new(pool.clone())
            .upsert_profile(
                id,
                UpsertProfileRequest {
                    email: Some(format!("{}@example.test", id)),
                    full_name: Some(name.to_string()),
                    role,
                    avatar_url: None,
                },
            )
            .await
            .expect("profile");
        Actor::new(id, role)
    }

    async fn pending_loan(pool: &PgPool, borrower: &Actor, amount: i64) -> Uuid {
        LoanService::new(pool.clone())
            .create_loan(
                borrower,
                CreateLoanRequest {
                    amount,
                    description: "Irrigation pump".to_string(),
                },
            )
            .await
            .expect("loan")
            .id
    }

    async fn make_offer(pool: &PgPool, lender: &Actor, loan_id: Uuid, amount: i64) -> Uuid {
        OfferService::new(pool.clone())
            .create_offer(
                lender,
                loan_id,
                CreateOfferRequest {
                    amount,
                    message: None,
                },
            )
            .await
            .expect("offer")
            .id
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_accepting_offer_activates_loan_and_rejects_siblings() {
        let pool = setup_test_db().await;
        let offers = OfferService::new(pool.clone());
        let loans = LoanService::new(pool.clone());

        let borrower = member(&pool, UserRole::Borrower, "Ada").await;
        let first = member(&pool, UserRole::Lender, "Lin").await;
        let second = member(&pool, UserRole::Lender, "Ola").await;

        let loan_id = pending_loan(&pool, &borrower, 1000).await;
        let chosen = make_offer(&pool, &first, loan_id, 1000).await;
        let other = make_offer(&pool, &second, loan_id, 900).await;

        let accepted = offers.accept_offer(&borrower, chosen).await.unwrap();
        assert!(!accepted.already_accepted);
        assert_eq!(accepted.rejected_offer_ids, vec![other]);

        let loan = loans.get_loan(loan_id).await.unwrap();
        assert_eq!(loan.status, LoanStatus::Active);
        assert_eq!(loan.lender_id, Some(first.user_id));
        assert_eq!(
            offers.get_offer(other).await.unwrap().status,
            OfferStatus::Rejected
        );

        // Property: accepting again changes nothing
        let again = offers.accept_offer(&borrower, chosen).await.unwrap();
        assert!(again.already_accepted);
        assert_eq!(again.loan.lender_id, Some(first.user_id));

        let late = offers.accept_offer(&borrower, other).await;
        assert!(matches!(late, Err(ApiError::Conflict(_))));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_concurrent_acceptances_leave_one_winner() {
        let pool = setup_test_db().await;
        let offers = OfferService::new(pool.clone());

        let borrower = member(&pool, UserRole::Borrower, "Bo").await;
        let a = member(&pool, UserRole::Lender, "Ana").await;
        let b = member(&pool, UserRole::Lender, "Ben").await;

        let loan_id = pending_loan(&pool, &borrower, 500).await;
        let offer_a = make_offer(&pool, &a, loan_id, 500).await;
        let offer_b = make_offer(&pool, &b, loan_id, 500).await;

        let (ra, rb) = tokio::join!(
            offers.accept_offer(&borrower, offer_a),
            offers.accept_offer(&borrower, offer_b)
        );
        assert_eq!(ra.is_ok() as u8 + rb.is_ok() as u8, 1);

        let accepted = offers
            .list_offers_for_loan(loan_id)
            .await
            .unwrap()
            .into_iter()
            .filter(|o| o.status == OfferStatus::Accepted)
            .count();
        assert_eq!(accepted, 1);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_counter_acceptance_closes_product_offer() {
        let pool = setup_test_db().await;
        let products = ProductOfferService::new(pool.clone());

        let borrower = member(&pool, UserRole::Borrower, "Kemi").await;
        let lender_a = member(&pool, UserRole::Lender, "Tayo").await;
        let lender_b = member(&pool, UserRole::Lender, "Femi").await;
        let loan_id = pending_loan(&pool, &borrower, 2000).await;

        let category_id = products.list_categories().await.unwrap()[0].id;
        let product = products
            .create_product_offer(
                &borrower,
                loan_id,
                CreateProductOfferRequest {
                    category_id,
                    title: "Generator".to_string(),
                    description: None,
                    specifications: None,
                    age: None,
                    amount: 1500,
                    image_url: None,
                },
            )
            .await
            .unwrap();

        let bid = |amount| CreateCounterOfferRequest {
            amount,
            message: None,
        };
        let winner = products
            .create_counter_offer(&lender_a, product.id, bid(1200))
            .await
            .unwrap();
        let loser = products
            .create_counter_offer(&lender_b, product.id, bid(1100))
            .await
            .unwrap();

        let accepted = products
            .accept_counter_offer(&borrower, winner.id)
            .await
            .unwrap();
        assert_eq!(accepted.product_offer.status, ReviewStatus::Accepted);
        assert_eq!(accepted.rejected_counter_ids, vec![loser.id]);

        let detail = products.get_product_offer(product.id).await.unwrap();
        for counter in detail.counter_offers {
            let expected = if counter.id == winner.id {
                ReviewStatus::Accepted
            } else {
                ReviewStatus::Rejected
            };
            assert_eq!(counter.status, expected);
        }

        let again = products
            .accept_counter_offer(&borrower, winner.id)
            .await
            .unwrap();
        assert!(again.already_accepted);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_repayment_negotiation_log() {
        let pool = setup_test_db().await;
        let offers = OfferService::new(pool.clone());
        let repayments = RepaymentService::new(pool.clone());

        let borrower = member(&pool, UserRole::Borrower, "Zed").await;
        let lender = member(&pool, UserRole::Lender, "Yara").await;
        let loan_id = pending_loan(&pool, &borrower, 500).await;
        let offer_id = make_offer(&pool, &lender, loan_id, 500).await;
        offers.accept_offer(&borrower, offer_id).await.unwrap();

        let proposed = repayments
            .propose(
                &borrower,
                offer_id,
                ProposalTerms {
                    method: RepaymentMethod::Payment,
                    amount: 500,
                    details: None,
                    message: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(proposed.repayment_status, RepaymentStatus::Proposed);

        let countered = repayments
            .counter(
                &lender,
                offer_id,
                ProposalTerms {
                    method: RepaymentMethod::Services,
                    amount: 450,
                    details: Some("Two weeks of harvest help".to_string()),
                    message: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(countered.repayment_status, RepaymentStatus::Counter);
        assert_eq!(countered.lender_repayment_proposal.unwrap().amount, 450);
        assert_eq!(countered.borrower_repayment_proposal.unwrap().amount, 500);

        let offer = offers.get_offer(offer_id).await.unwrap();
        assert_eq!(offer.repayment_status, RepaymentStatus::Counter);

        let stranger = member(&pool, UserRole::Lender, "Xi").await;
        let denied = repayments.repayment_state(&stranger, offer_id).await;
        assert!(matches!(denied, Err(ApiError::Forbidden(_))));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_payments_complete_the_loan() {
        let pool = setup_test_db().await;
        let loans = LoanService::new(pool.clone());

        let borrower = member(&pool, UserRole::Borrower, "Pia").await;
        let lender = member(&pool, UserRole::Lender, "Quin").await;
        let loan_id = pending_loan(&pool, &borrower, 300).await;
        let offer_id = make_offer(&pool, &lender, loan_id, 300).await;
        OfferService::new(pool.clone())
            .accept_offer(&borrower, offer_id)
            .await
            .unwrap();

        let pay = |amount| RecordPaymentRequest { amount, note: None };
        let first = loans.record_payment(&borrower, loan_id, pay(100)).await.unwrap();
        assert_eq!(first.loan_status, LoanStatus::Active);

        let last = loans.record_payment(&borrower, loan_id, pay(200)).await.unwrap();
        assert_eq!(last.total_paid, 300);
        assert_eq!(last.loan_status, LoanStatus::Completed);

        let closed = loans.record_payment(&borrower, loan_id, pay(1)).await;
        assert!(matches!(closed, Err(ApiError::Conflict(_))));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_message_inbox_and_unread_count() {
        let pool = setup_test_db().await;
        let messages = MessageService::new(pool.clone());

        let borrower = member(&pool, UserRole::Borrower, "Ines").await;
        let lender = member(&pool, UserRole::Lender, "Jon").await;

        let sent = messages
            .send_message(
                &borrower,
                SendMessageRequest {
                    recipient_id: lender.user_id,
                    subject: None,
                    content: "Could you do 6 months?".to_string(),
                    reply_to: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(sent.subject, "(no subject)");

        let inbox = messages
            .inbox(&lender, PaginationParams::default())
            .await
            .unwrap();
        let matching: Vec<_> = inbox.iter().filter(|m| m.id == sent.id).collect();
        assert_eq!(matching.len(), 1);
        assert!(!matching[0].read);

        let before = messages.unread_count(&lender).await.unwrap().unread;
        messages.mark_as_read(&lender, sent.id).await.unwrap();
        messages.mark_as_read(&lender, sent.id).await.unwrap();
        let after = messages.unread_count(&lender).await.unwrap().unread;
        assert_eq!(after, before - 1);

        let by_sender = messages.mark_as_read(&borrower, sent.id).await;
        assert!(matches!(by_sender, Err(ApiError::Forbidden(_))));

        let contacts = messages.contacts(&borrower).await.unwrap();
        assert!(contacts.iter().any(|p| p.id == lender.user_id));
        assert!(contacts.iter().all(|p| p.role == UserRole::Lender));

        let to_self = messages
            .send_message(
                &borrower,
                SendMessageRequest {
                    recipient_id: borrower.user_id,
                    subject: None,
                    content: "note to self".to_string(),
                    reply_to: None,
                },
            )
            .await;
        assert!(matches!(to_self, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_offer_made_during_acceptance_is_refused() {
        let pool = setup_test_db().await;
        let offers = OfferService::new(pool.clone());

        let borrower = member(&pool, UserRole::Borrower, "Uma").await;
        let chosen = member(&pool, UserRole::Lender, "Vic").await;
        let latecomer = member(&pool, UserRole::Lender, "Wes").await;

        let loan_id = pending_loan(&pool, &borrower, 700).await;
        let offer_id = make_offer(&pool, &chosen, loan_id, 700).await;

        // Hold the loan row lock the way an acceptance does, then activate it.
        let mut tx = pool.begin().await.unwrap();
        sqlx::query("SELECT id FROM loans WHERE id = $1 FOR UPDATE")
            .bind(loan_id)
            .execute(&mut *tx)
            .await
            .unwrap();

        let racing = {
            let offers = offers.clone();
            tokio::spawn(async move {
                offers
                    .create_offer(
                        &latecomer,
                        loan_id,
                        CreateOfferRequest {
                            amount: 650,
                            message: None,
                        },
                    )
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(200)).await;

        sqlx::query("UPDATE offers SET status = $1 WHERE id = $2")
            .bind(OfferStatus::Accepted)
            .bind(offer_id)
            .execute(&mut *tx)
            .await
            .unwrap();
        sqlx::query("UPDATE loans SET status = $1, lender_id = $2 WHERE id = $3")
            .bind(LoanStatus::Active)
            .bind(chosen.user_id)
            .bind(loan_id)
            .execute(&mut *tx)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let late = racing.await.unwrap();
        assert!(matches!(late, Err(ApiError::Conflict(_))));

        let statuses: Vec<OfferStatus> = offers
            .list_offers_for_loan(loan_id)
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.status)
            .collect();
        assert_eq!(statuses, vec![OfferStatus::Accepted]);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_product_offer_on_cancelled_loan_is_refused() {
        let pool = setup_test_db().await;
        let products = ProductOfferService::new(pool.clone());

        let borrower = member(&pool, UserRole::Borrower, "Abe").await;
        let loan_id = pending_loan(&pool, &borrower, 400).await;
        LoanService::new(pool.clone())
            .cancel_loan(&borrower, loan_id)
            .await
            .unwrap();

        let category_id = products.list_categories().await.unwrap()[0].id;
        let result = products
            .create_product_offer(
                &borrower,
                loan_id,
                CreateProductOfferRequest {
                    category_id,
                    title: "Bicycle".to_string(),
                    description: None,
                    specifications: None,
                    age: None,
                    amount: 100,
                    image_url: None,
                },
            )
            .await;
        assert!(matches!(result, Err(ApiError::Conflict(_))));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_blank_loan_description_is_rejected() {
        let pool = setup_test_db().await;
        let borrower = member(&pool, UserRole::Borrower, "Cal").await;

        let result = LoanService::new(pool.clone())
            .create_loan(
                &borrower,
                CreateLoanRequest {
                    amount: 50,
                    description: "   ".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(ApiError::ValidationError(_))));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_members_cannot_make_themselves_admin() {
        let pool = setup_test_db().await;
        let profiles = ProfileService::new(pool.clone());
        let lender = member(&pool, UserRole::Lender, "Dee").await;

        let promoted = profiles
            .upsert_profile(
                lender.user_id,
                UpsertProfileRequest {
                    email: None,
                    full_name: None,
                    role: UserRole::Admin,
                    avatar_url: None,
                },
            )
            .await;
        assert!(matches!(promoted, Err(ApiError::Forbidden(_))));
        assert_eq!(
            profiles.get_profile(lender.user_id).await.unwrap().role,
            UserRole::Lender
        );

        // A role granted out of band survives a profile edit.
        let admin_id = Uuid::new_v4();
        sqlx::query("INSERT INTO profiles (id, full_name, role) VALUES ($1, 'Ops', 'admin')")
            .bind(admin_id)
            .execute(&pool)
            .await
            .unwrap();
        let edited = profiles
            .upsert_profile(
                admin_id,
                UpsertProfileRequest {
                    email: None,
                    full_name: Some("Operations".to_string()),
                    role: UserRole::Borrower,
                    avatar_url: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.role, UserRole::Admin);
        assert_eq!(edited.full_name.as_deref(), Some("Operations"));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_contacts_are_the_opposite_role() {
        let pool = setup_test_db().await;
        let messages = MessageService::new(pool.clone());

        let borrower = member(&pool, UserRole::Borrower, "Eve").await;
        let other_borrower = member(&pool, UserRole::Borrower, "Fay").await;
        let lender = member(&pool, UserRole::Lender, "Gus").await;

        let borrower_contacts = messages.contacts(&borrower).await.unwrap();
        assert!(borrower_contacts.iter().any(|p| p.id == lender.user_id));
        assert!(borrower_contacts.iter().all(|p| p.role == UserRole::Lender));

        let lender_contacts = messages.contacts(&lender).await.unwrap();
        assert!(lender_contacts.iter().any(|p| p.id == borrower.user_id));
        assert!(lender_contacts.iter().any(|p| p.id == other_borrower.user_id));
        assert!(lender_contacts.iter().all(|p| p.role == UserRole::Borrower));
        assert!(lender_contacts.iter().all(|p| p.id != lender.user_id));

        let admin = Actor::new(Uuid::new_v4(), UserRole::Admin);
        sqlx::query("INSERT INTO profiles (id, full_name, role) VALUES ($1, 'Root', 'admin')")
            .bind(admin.user_id)
            .execute(&pool)
            .await
            .unwrap();
        let admin_contacts = messages.contacts(&admin).await.unwrap();
        assert!(admin_contacts.iter().any(|p| p.id == borrower.user_id));
        assert!(admin_contacts.iter().any(|p| p.id == lender.user_id));
        assert!(admin_contacts.iter().all(|p| p.id != admin.user_id));
    }
}
