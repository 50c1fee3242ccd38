pub mod mock_oracle;
pub mod prepare_env;
