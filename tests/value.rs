#[cfg(test)]
mod tests {
    use ladle::{AsValue, EnumEncoding, EnumValue, Value, sql_enum};
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use time::{Date, Month, PrimitiveDateTime, Time};
    use uuid::Uuid;

    sql_enum! {
        pub enum Category {
            Beverages = 1,
            Produce = 2,
            Seafood = 8,
        }
    }

    #[test]
    fn value_bool() {
        assert_eq!(true.as_value(), Value::Boolean(Some(true)));
        assert_eq!(bool::try_from_value(Value::Boolean(Some(false))).unwrap(), false);
        assert_eq!(bool::try_from_value(1_i8.as_value()).unwrap(), true);
        assert_eq!(bool::try_from_value(0_i64.as_value()).unwrap(), false);
        assert_eq!(bool::try_from_value(9_u16.as_value()).unwrap(), true);
        assert!(bool::try_from_value(0.5_f32.as_value()).is_err());
        assert_eq!(bool::parse("true").unwrap(), true);
        assert_eq!(bool::parse("0").unwrap(), false);
        assert!(bool::parse("hello").is_err());
        assert!(bool::parse("").is_err());
    }

    #[test]
    fn value_integers_widen_and_narrow() {
        assert_eq!(42_i32.as_value(), Value::Int32(Some(42)));
        assert_eq!(i32::try_from_value(Value::Int8(Some(-4))).unwrap(), -4);
        assert_eq!(i64::try_from_value(Value::UInt32(Some(7))).unwrap(), 7);
        assert_eq!(u8::try_from_value(Value::Int64(Some(200))).unwrap(), 200);
        let overflow = i32::try_from_value(Value::Int64(Some(5_000_000_000)));
        assert!(overflow.is_err());
        assert!(overflow.unwrap_err().to_string().contains("out of range"));
        assert!(u16::try_from_value(Value::Int32(Some(-1))).is_err());
        assert_eq!(i16::try_from_value(Value::Unknown(Some("-128".into()))).unwrap(), -128);
        assert!(i16::parse("12 potatoes").is_err());
    }

    #[test]
    fn value_floats() {
        assert_eq!(1.5_f64.as_value(), Value::Float64(Some(1.5)));
        assert_eq!(f64::try_from_value(Value::Float32(Some(0.25))).unwrap(), 0.25);
        assert_eq!(f32::try_from_value(Value::Int16(Some(3))).unwrap(), 3.0);
        assert_eq!(
            f64::try_from_value(Value::Decimal(Some(Decimal::new(125, 2)), 18, 2)).unwrap(),
            1.25
        );
        assert_eq!(f64::parse("2.75").unwrap(), 2.75);
        assert!(f64::parse("two point five").is_err());
    }

    #[test]
    fn value_decimal() {
        let price = Decimal::from_str("19.99").unwrap();
        assert!(matches!(price.as_value(), Value::Decimal(Some(..), ..)));
        assert_eq!(
            Decimal::try_from_value(Value::Int32(Some(5))).unwrap(),
            Decimal::from(5)
        );
        assert_eq!(Decimal::parse("19.99").unwrap(), price);
    }

    #[test]
    fn value_string_and_char() {
        assert_eq!("hi".to_string().as_value(), Value::Varchar(Some("hi".into())));
        assert_eq!(
            String::try_from_value(Value::Unknown(Some("raw".into()))).unwrap(),
            "raw"
        );
        assert_eq!(String::try_from_value(Value::Char(Some('x'))).unwrap(), "x");
        assert_eq!(char::try_from_value(Value::Char(Some('y'))).unwrap(), 'y');
        assert_eq!(char::try_from_value(Value::Varchar(Some("z".into()))).unwrap(), 'z');
        let too_long = char::try_from_value(Value::Varchar(Some("zz".into())));
        assert!(too_long.is_err());
        assert!(
            too_long
                .unwrap_err()
                .to_string()
                .contains("exactly one character is required")
        );
        assert!(char::try_from_value(Value::Varchar(Some("".into()))).is_err());
    }

    #[test]
    fn value_temporal_parsing() {
        // The time types carry an inherent two-argument `parse`, so the
        // trait method has to be named explicitly.
        let date = Date::from_calendar_date(2024, Month::May, 17).unwrap();
        assert_eq!(<Date as AsValue>::parse("2024-05-17").unwrap(), date);
        assert_eq!(
            Date::try_from_value(Value::Unknown(Some("2024-05-17".into()))).unwrap(),
            date
        );
        let time = Time::from_hms(8, 30, 0).unwrap();
        assert_eq!(<Time as AsValue>::parse("08:30:00").unwrap(), time);
        let timestamp = PrimitiveDateTime::new(date, time);
        assert_eq!(
            <PrimitiveDateTime as AsValue>::parse("2024-05-17T08:30:00").unwrap(),
            timestamp
        );
        assert_eq!(
            <PrimitiveDateTime as AsValue>::parse("2024-05-17 08:30:00").unwrap(),
            timestamp
        );
        assert!(<Date as AsValue>::parse("17/05/2024").is_err());
        assert_eq!(
            Time::try_from_value(Value::Unknown(Some("23:59:59.25".into()))).unwrap(),
            Time::from_hms_milli(23, 59, 59, 250).unwrap()
        );
    }

    #[test]
    fn value_uuid() {
        let id = Uuid::from_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        assert_eq!(id.as_value(), Value::Uuid(Some(id)));
        assert_eq!(
            Uuid::try_from_value(Value::Varchar(Some(id.to_string()))).unwrap(),
            id
        );
        assert!(Uuid::parse("not-a-uuid").is_err());
    }

    #[test]
    fn value_option_is_nullable() {
        assert!(<Option<i32>>::nullable());
        assert!(!i32::nullable());
        assert_eq!(<Option<i32>>::try_from_value(Value::Null).unwrap(), None);
        assert_eq!(
            <Option<i32>>::try_from_value(Value::Int32(None)).unwrap(),
            None
        );
        assert_eq!(
            <Option<i32>>::try_from_value(Value::Int32(Some(4))).unwrap(),
            Some(4)
        );
        assert_eq!(None::<String>.as_value(), Value::Varchar(None));
    }

    #[test]
    fn enum_decodes_names_values_and_digit_strings() {
        assert_eq!(Category::try_from_value(Value::Varchar(Some("Produce".into()))).unwrap(), Category::Produce);
        // Matching is case-insensitive and trims the payload.
        assert_eq!(
            Category::try_from_value(Value::Unknown(Some("  seafood ".into()))).unwrap(),
            Category::Seafood
        );
        assert_eq!(Category::try_from_value(Value::Int16(Some(8))).unwrap(), Category::Seafood);
        // A digit-only string is retried as a member value.
        assert_eq!(Category::try_from_value(Value::Varchar(Some("2".into()))).unwrap(), Category::Produce);
        // A single character behaves like a one-character string.
        assert_eq!(Category::try_from_value(Value::Char(Some('2'))).unwrap(), Category::Produce);
        let unknown_char = Category::try_from_value(Value::Char(Some('x')));
        assert!(unknown_char.unwrap_err().to_string().contains("no matching name"));
        let blank = Category::try_from_value(Value::Varchar(Some("   ".into())));
        assert!(blank.unwrap_err().to_string().contains("empty or whitespace"));
        let unknown_name = Category::try_from_value(Value::Varchar(Some("Cheese".into())));
        assert!(unknown_name.unwrap_err().to_string().contains("no matching name"));
        let unknown_value = Category::try_from_value(Value::Int64(Some(3)));
        assert!(unknown_value.unwrap_err().to_string().contains("no matching value"));
        let wrong_kind = Category::try_from_value(Value::Boolean(Some(true)));
        assert!(wrong_kind.is_err());
    }

    #[test]
    fn enum_encodes_per_request() {
        assert!(Category::is_enumeration());
        assert_eq!(
            Category::Beverages.encode(EnumEncoding::Text),
            Value::Varchar(Some("Beverages".into()))
        );
        assert_eq!(
            Category::Seafood.encode(EnumEncoding::Integer),
            Value::Int64(Some(8))
        );
        assert_eq!(Category::default(), Category::Beverages);
        assert_eq!(Category::from_name("produce"), Some(Category::Produce));
        assert_eq!(Category::from_value(42), None);
    }

    #[test]
    fn value_type_predicates() {
        assert!(Value::Varchar(None).is_textual());
        assert!(Value::Unknown(None).is_textual());
        assert!(!Value::Blob(None).is_textual());
        assert!(Value::UInt8(None).is_integer());
        assert!(Value::Decimal(None, 18, 2).is_numeric());
        assert!(Value::Int32(None).is_null());
        assert!(!Value::Int32(Some(0)).is_null());
        assert_eq!(Value::Int64(Some(-3)).as_integer(), Some(-3));
        assert_eq!(Value::Varchar(Some("3".into())).as_integer(), None);
    }
}
