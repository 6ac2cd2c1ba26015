use serde::{Serialize, Serializer};
use sqlx::error::BoxDynError;
use sqlx::postgres::{PgTypeInfo, PgValueRef};
use sqlx::{Decode, Postgres, Type, ValueRef};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

/// `created_at` 列の値
///
/// `TIMESTAMP` / `TIMESTAMPTZ` のどちらの列からも読める。
/// ISO-8601 で出力し、`TIMESTAMP` はオフセットなし、`TIMESTAMPTZ` は RFC 3339。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    Naive(PrimitiveDateTime),
    Zoned(OffsetDateTime),
}

impl Timestamp {
    pub fn to_iso8601(&self) -> Result<String, time::error::Format> {
        match self {
            Self::Naive(value) if value.nanosecond() == 0 => {
                value.format(format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"))
            }
            Self::Naive(value) => value.format(format_description!(
                "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]"
            )),
            Self::Zoned(value) => value.format(&Rfc3339),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let formatted = self.to_iso8601().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }
}

impl Type<Postgres> for Timestamp {
    fn type_info() -> PgTypeInfo {
        <PrimitiveDateTime as Type<Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <PrimitiveDateTime as Type<Postgres>>::compatible(ty)
            || <OffsetDateTime as Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for Timestamp {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let zoned = <OffsetDateTime as Type<Postgres>>::compatible(&value.type_info());
        if zoned {
            Ok(Self::Zoned(<OffsetDateTime as Decode<Postgres>>::decode(value)?))
        } else {
            Ok(Self::Naive(<PrimitiveDateTime as Decode<Postgres>>::decode(value)?))
        }
    }
}

impl From<PrimitiveDateTime> for Timestamp {
    fn from(value: PrimitiveDateTime) -> Self {
        Self::Naive(value)
    }
}

impl From<OffsetDateTime> for Timestamp {
    fn from(value: OffsetDateTime) -> Self {
        Self::Zoned(value)
    }
}
