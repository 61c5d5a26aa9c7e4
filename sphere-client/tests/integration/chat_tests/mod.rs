pub mod test_data_channel_fallback;
