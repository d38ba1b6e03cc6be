//! 原生币金额
//!
//! 用户输入的十进制字符串必须无损地换算成链上最小单位（如 wei）。

use std::fmt;

use rust_decimal::Decimal;

use crate::error::AmountError;

/// EVM 原生币精度
pub const DEFAULT_NATIVE_DECIMALS: u32 = 18;

/// 已校验的正数金额及其最小单位表示
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeAmount {
    raw: String,
    value: Decimal,
    base_units: u128,
}

impl NativeAmount {
    /// 解析十进制金额字符串
    ///
    /// 拒绝：空串、非数字、非正数、小数位超过 `decimals`、换算后溢出 u128。
    pub fn parse(raw: &str, decimals: u32) -> Result<Self, AmountError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AmountError::Empty);
        }

        let value = Decimal::from_str_exact(trimmed)
            .map_err(|_| AmountError::NotNumeric(trimmed.to_string()))?;

        if value <= Decimal::ZERO {
            return Err(AmountError::NotPositive);
        }

        // 去掉尾随 0，"1.500" 与 "1.5" 等价
        let value = value.normalize();
        let scale = value.scale();
        if scale > decimals {
            return Err(AmountError::TooPrecise { decimals });
        }

        let mantissa = u128::try_from(value.mantissa()).map_err(|_| AmountError::Overflow)?;
        let factor = 10u128
            .checked_pow(decimals - scale)
            .ok_or(AmountError::Overflow)?;
        let base_units = mantissa
            .checked_mul(factor)
            .ok_or(AmountError::Overflow)?;

        Ok(Self {
            raw: trimmed.to_string(),
            value,
            base_units,
        })
    }

    /// 用户输入的原始金额（已去除首尾空白），原样发给兑换接口
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn base_units(&self) -> u128 {
        self.base_units
    }

    /// JSON-RPC 使用的十六进制数量，如 `0xde0b6b3a7640000`
    pub fn base_units_hex(&self) -> String {
        format!("{:#x}", self.base_units)
    }
}

impl fmt::Display for NativeAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
