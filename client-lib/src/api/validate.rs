use super::ApiError;
use crate::model::{Credentials, NewReview, Signup};
use ::anyhow::Result;
use ::regex::Regex;
use ::std::sync::OnceLock;

const MIN_PASSWORD_LENGTH: usize = 6;

fn invalid(message: &str) -> ::anyhow::Error {
    ApiError::Validation(message.to_string()).into()
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex")
    })
}

fn phone_regex() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| Regex::new(r"^[0-9]{10}$").expect("valid phone regex"))
}

fn require(value: &str, message: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(message));
    }
    Ok(())
}

pub fn page(page: u32, limit: u32) -> Result<()> {
    if page == 0 {
        return Err(invalid("Page numbers start at 1"));
    }
    if limit == 0 {
        return Err(invalid("Page limit must be at least 1"));
    }
    Ok(())
}

pub fn comment(text: &str) -> Result<()> {
    require(text, "Comment cannot be empty")
}

pub fn new_review(review: &NewReview) -> Result<()> {
    require(&review.title, "Title is required")?;
    require(&review.author, "Author is required")?;
    require(&review.review, "Review text is required")?;
    if !(1..=5).contains(&review.rating) {
        return Err(invalid("Rating must be between 1 and 5"));
    }
    if review.cover.bytes.is_empty() {
        return Err(invalid("A cover image is required"));
    }
    Ok(())
}

fn email(email: &str) -> Result<()> {
    require(email, "Email is required")?;
    if !email_regex().is_match(email) {
        return Err(invalid("Invalid email"));
    }
    Ok(())
}

fn password(password: &str) -> Result<()> {
    require(password, "Password is required")?;
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(invalid("Password must be at least 6 characters"));
    }
    Ok(())
}

pub fn credentials(credentials: &Credentials) -> Result<()> {
    email(&credentials.email)?;
    password(&credentials.password)
}

pub fn signup(signup: &Signup) -> Result<()> {
    require(&signup.name, "Full name is required")?;
    email(&signup.email)?;
    require(&signup.phone, "Phone is required")?;
    if !phone_regex().is_match(&signup.phone) {
        return Err(invalid("Phone number must be 10 digits"));
    }
    password(&signup.password)
}
