mod test_signal_relay;
