use mailgun_transport::{
    enqueue_with, Address, Email, Job, JobOpts, MailConfig, MailerRegistry, MemoryQueue,
    QueueProvider, SendEmailJob,
};

fn test_email() -> Email {
    Email::builder()
        .from(Address::new("noreply@example.com"))
        .to("user@example.com")
        .subject("Hello")
        .html("<p>Hi</p>")
        .build()
        .unwrap()
}

#[tokio::test]
async fn send_email_job_round_trips_through_queue() {
    let queue = MemoryQueue::new();
    let email = test_email();

    let job = SendEmailJob::<MailerRegistry>::new(email.clone()).on_mailer("mailgun");
    let opts = JobOpts {
        queue: Some("emails".to_string()),
        ..JobOpts::default()
    };
    let id = enqueue_with(&queue, job, opts).await.unwrap();

    let entry = queue.claim_next("emails").await.unwrap().unwrap();
    assert_eq!(entry.id, id);
    assert_eq!(entry.job_type, "mail::send_email");
    assert_eq!(entry.queue, "emails");

    let restored: SendEmailJob<MailerRegistry> = serde_json::from_value(entry.payload).unwrap();
    assert_eq!(restored.mailer.as_deref(), Some("mailgun"));
    assert_eq!(restored.email, email);
}

#[tokio::test]
async fn perform_fails_when_mailer_is_not_configured() {
    // Default config declares no mailers, so resolution must fail before any
    // network activity.
    let registry = MailerRegistry::from_config(&MailConfig::default()).unwrap();

    let job = SendEmailJob::<MailerRegistry>::new(test_email());
    let err = job.perform(&registry).await.unwrap_err();

    assert!(err.to_string().contains("not configured"));
}
