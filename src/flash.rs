//! One-shot messages carried across a redirect.
//!
//! The cookie only ever holds a message code, so a forged cookie can at
//! worst pick a different canned message.

use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::auth::cookies::{clear_cookie, get_cookie_value, set_cookie};
use crate::auth::users::RegistrationError;

pub const FLASH_COOKIE: &str = "ruoka_flash";

macro_rules! flash_messages {
    ($($variant:ident => ($code:literal, $error:literal, $text:literal),)*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum Flash {
            $($variant,)*
        }

        impl Flash {
            pub fn code(self) -> &'static str {
                match self {
                    $(Self::$variant => $code,)*
                }
            }

            pub fn from_code(code: &str) -> Option<Self> {
                match code {
                    $($code => Some(Self::$variant),)*
                    _ => None,
                }
            }

            pub fn message(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)*
                }
            }

            /// Rendered with the error style.
            pub fn is_error(self) -> bool {
                match self {
                    $(Self::$variant => $error,)*
                }
            }
        }
    };
}

flash_messages! {
    Registered => ("registered", false, "Account created. You can now log in."),
    UsernameInvalid => ("username-invalid", true, "Username must be at least 4 letters or digits."),
    PasswordTooShort => ("password-short", true, "Password must be at least 8 characters."),
    PasswordIsUsername => ("password-username", true, "Password must not equal the username."),
    PasswordMismatch => ("password-mismatch", true, "Passwords do not match."),
    UsernameTaken => ("username-taken", true, "Username is already taken."),
    LoggedIn => ("logged-in", false, "Logged in. Welcome!"),
    LoginFailed => ("login-failed", true, "Wrong username or password."),
    LoggedOut => ("logged-out", false, "You have logged out."),
    LoginRequired => ("login-required", true, "Please log in first."),
    RecipeCreated => ("recipe-created", false, "Recipe created."),
    RecipeTitleInvalid => ("title-invalid", true, "Recipe title must be at least 4 letters or digits."),
    RecipeNameTaken => ("name-taken", true, "A recipe with that name already exists."),
    RecipeSaved => ("recipe-saved", false, "Changes saved."),
    InvalidValue => ("invalid-value", true, "Some values were invalid. Nothing was saved."),
    SaveFailed => ("save-failed", true, "Saving failed. Please try again."),
    ListFull => ("list-full", true, "The list is full. No row was added."),
    RecipeDeleted => ("recipe-deleted", false, "Recipe deleted."),
    RecipeNotFound => ("recipe-not-found", true, "Recipe not found."),
    ReviewSaved => ("review-saved", false, "Review saved."),
    ReviewDeleted => ("review-deleted", false, "Review deleted."),
    ReviewFailed => ("review-failed", true, "Could not create the review."),
    RatingInvalid => ("rating-invalid", true, "Rating must be between 1 and 5."),
    ReviewNotFound => ("review-not-found", true, "Review not found."),
    CategoryNotFound => ("category-not-found", true, "Category not found."),
}

impl Flash {
    pub fn cookie(self) -> String {
        set_cookie(FLASH_COOKIE, self.code(), 60)
    }
}

impl From<RegistrationError> for Flash {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::UsernameInvalid => Self::UsernameInvalid,
            RegistrationError::PasswordTooShort => Self::PasswordTooShort,
            RegistrationError::PasswordIsUsername => Self::PasswordIsUsername,
            RegistrationError::PasswordMismatch => Self::PasswordMismatch,
        }
    }
}

/// 303 redirect to `location`, optionally carrying a flash message.
pub fn redirect(location: &str, flash: Option<Flash>) -> Response {
    let mut response = (StatusCode::SEE_OTHER, [(header::LOCATION, location.to_string())])
        .into_response();
    if let Some(flash) = flash {
        if let Ok(value) = HeaderValue::from_str(&flash.cookie()) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

pub fn redirect_with(location: &str, flash: Flash) -> Response {
    redirect(location, Some(flash))
}

/// The message waiting for this request, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IncomingFlash(pub Option<Flash>);

impl IncomingFlash {
    pub fn from_headers(headers: &axum::http::HeaderMap) -> Self {
        Self(get_cookie_value(headers, FLASH_COOKIE).and_then(Flash::from_code))
    }
}

impl<S: Send + Sync> FromRequestParts<S> for IncomingFlash {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

/// Clears the flash cookie once a page has been rendered. Redirects and
/// responses that set a new flash keep it.
pub async fn clear_shown(request: Request, next: Next) -> Response {
    let had_flash = get_cookie_value(request.headers(), FLASH_COOKIE).is_some();
    let mut response = next.run(request).await;
    if !had_flash || response.status() != StatusCode::OK {
        return response;
    }

    let is_html = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/html"));
    let sets_flash = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with(FLASH_COOKIE));

    if is_html && !sets_flash {
        if let Ok(value) = HeaderValue::from_str(&clear_cookie(FLASH_COOKIE)) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;

    #[test]
    fn codes_round_trip() {
        for flash in [Flash::Registered, Flash::SaveFailed, Flash::ListFull] {
            assert_eq!(Flash::from_code(flash.code()), Some(flash));
        }
        assert_eq!(Flash::from_code("<script>"), None);
    }

    #[test]
    fn redirect_sets_location_and_cookie() {
        let response = redirect_with("/my/recipes", Flash::RecipeDeleted);
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/my/recipes");
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("ruoka_flash=recipe-deleted;"));
    }

    #[test]
    fn unknown_cookie_value_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("ruoka_flash=bogus"));
        assert_eq!(IncomingFlash::from_headers(&headers), IncomingFlash(None));

        headers.insert(header::COOKIE, HeaderValue::from_static("ruoka_flash=logged-out"));
        assert_eq!(
            IncomingFlash::from_headers(&headers),
            IncomingFlash(Some(Flash::LoggedOut))
        );
    }
}
