use validator::ValidateEmail;

use super::schemas::{FieldError, LeadDraft, LeadField, LeadForm, PhoneNumber};

/// Field-level checks run before any collaborator is contacted.
pub fn validate_lead_form(form: &LeadForm) -> Result<LeadDraft, Vec<FieldError>> {
    let mut errors = vec![];

    let name = form.name.trim().to_string();
    if name.is_empty() {
        errors.push(FieldError::new(LeadField::Name, "Please enter your name."));
    }

    let email = form.email.trim().to_string();
    if email.is_empty() {
        errors.push(FieldError::new(LeadField::Email, "Please enter your email."));
    } else if !email.validate_email() {
        errors.push(FieldError::new(
            LeadField::Email,
            "Please enter a valid email address.",
        ));
    }

    let phone = match PhoneNumber::parse(form.phone.trim()) {
        Ok(phone) => Some(phone),
        Err(message) => {
            errors.push(FieldError::new(LeadField::Phone, &message));
            None
        }
    };

    match phone {
        Some(phone) if errors.is_empty() => Ok(LeadDraft {
            name,
            email,
            phone,
            concern: form.concern.trim().to_string(),
        }),
        _ => Err(errors),
    }
}

pub fn validate_code(code: &str) -> Result<String, FieldError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(FieldError::new(LeadField::Code, "Please enter the OTP."));
    }
    Ok(code.to_string())
}

#[cfg(test)]
mod tests {
    use fake::faker::internet::en::SafeEmail;
    use fake::faker::name::en::Name;
    use fake::Fake;
    use quickcheck_macros::quickcheck;

    use super::{validate_code, validate_lead_form};
    use crate::flow::schemas::{LeadField, LeadForm, PhoneNumber};

    fn form(phone: &str) -> LeadForm {
        LeadForm {
            name: Name().fake(),
            email: SafeEmail().fake(),
            phone: phone.to_string(),
            concern: String::new(),
        }
    }

    #[test]
    fn test_valid_form_produces_draft() {
        let mut lead_form = form(" 9876543210 ");
        lead_form.concern = "  Screen time  ".to_string();
        let draft = validate_lead_form(&lead_form).expect("form should be valid");
        assert_eq!(draft.phone.as_str(), "9876543210");
        assert_eq!(draft.concern, "Screen time");
    }

    #[test]
    fn test_invalid_fields_are_reported_together() {
        let lead_form = LeadForm {
            name: "   ".to_string(),
            email: "not-an-email".to_string(),
            phone: "12345".to_string(),
            concern: String::new(),
        };
        let errors = validate_lead_form(&lead_form).unwrap_err();
        let fields: Vec<LeadField> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![LeadField::Name, LeadField::Email, LeadField::Phone]
        );
    }

    #[test]
    fn test_phone_rules() {
        for phone in ["12345", "98765432100", "98765-4321", "98765 4321", "९८७६५४३२१०", ""] {
            let errors = validate_lead_form(&form(phone)).unwrap_err();
            assert_eq!(errors.len(), 1, "phone {:?}", phone);
            assert_eq!(errors[0].field, LeadField::Phone);
        }
        assert!(validate_lead_form(&form("0000000000")).is_ok());
    }

    #[test]
    fn test_blank_code_is_rejected() {
        assert_eq!(validate_code("  ").unwrap_err().field, LeadField::Code);
        assert_eq!(validate_code(" 123456 ").unwrap(), "123456");
    }

    #[quickcheck]
    fn only_ten_ascii_digits_parse_as_phone(input: String) -> bool {
        let is_ten_digits = input.len() == 10 && input.chars().all(|c| c.is_ascii_digit());
        PhoneNumber::parse(&input).is_ok() == is_ten_digits
    }

    #[quickcheck]
    fn any_ten_digit_number_parses(digits: u64) -> bool {
        let phone = format!("{:010}", digits % 10_000_000_000);
        PhoneNumber::parse(&phone).is_ok()
    }
}
